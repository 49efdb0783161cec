//! Catalan design and technology vocabularies.
//!
//! Used by the technical-knowledge and specificity metrics. Entries with a
//! space (`pal sec`) never match a single cleaned token; they stay listed
//! so the vocabulary reads the same as the course glossary.

use std::collections::HashSet;
use std::sync::LazyLock;

/// Broad design vocabulary.
const TECHNICAL_TERMS_CA: &[&str] = &[
    "disseny", "color", "imatge", "text", "forma", "fons", "estil", "art", "gràfic", "visual",
    "projecte", "idea", "concepte", "creatiu", "dibuix", "esbós", "maqueta", "presentació",
    "arxiu", "document", "pàgina", "web", "digital", "paper", "llapis", "tinta", "quadre", "foto",
    "fotografia", "pintura", "il·lustració", "video", "àudio", "mida", "gran", "petit", "ample",
    "alt", "mesura", "proposta", "referència", "inspiració", "moda", "tendència", "marca", "logo",
    "icona", "símbol", "lletra", "font", "tipus", "títol", "cos", "espai", "blanc", "negre",
    "blau", "vermell", "groc", "verd", "bocet", "esborrany", "final", "entrega", "client",
    "usuari", "briefing", "target", "objectiu", "missatge", "comunicació",
];

/// Specific, concrete design vocabulary.
const SPECIFIC_TERMS_CA: &[&str] = &[
    // Typography
    "tipografia", "serif", "sans-serif", "pal sec", "romana", "cursiva", "negreta", "versaleta",
    "interlineatge", "kerning", "tracking", "lligadura", "glif", "ascendent", "descendent", "ull",
    "remat", "caixa", "alta", "baixa", "família", "font", "lletra", "legibilitat", "llegibilitat",
    "paràgraf", "alineació", "justificat", "esquerra", "dreta", "centrat", "orfe", "vídua", "riu",
    "taca",
    // Layout and grid
    "reticle", "graella", "jerarquia", "composició", "contrast", "equilibri", "pes", "tensió",
    "ritme", "repetició", "proporció", "escala", "aire", "respirar", "marge", "columna",
    "mitjanit", "carrer", "gutter", "sagnat", "sang", "tall", "troquel", "plec", "díptic",
    "tríptic", "fulletó", "cartell", "pòster", "bànner", "capçalera", "peu", "foli", "numeració",
    "secció", "capítol",
    // Color and image
    "cmyk", "rgb", "pantone", "hex", "hexadecimal", "saturació", "lluentor", "matís", "to",
    "valor", "gamut", "perfil", "calibració", "vector", "píxel", "mapa", "bits", "ràster",
    "resolució", "dpi", "ppi", "72ppp", "300ppp", "interpolació", "compressió", "jpg", "png",
    "svg", "pdf", "tiff", "gif", "psd", "ai", "indd", "raw", "exposició", "enfocament",
    "profunditat", "camp", "balanç", "blancs", "historial", "filtre", "màscara", "capa", "canal",
    "traç", "farciment", "degradat", "opacitat", "fusió", "vectorial", "bitmap",
    // Branding and UX/UI
    "branding", "identitat", "corporativa", "logotip", "isotip", "imagotip", "isologotip",
    "manual", "normativa", "aplicació", "papereria", "targeta", "sobre", "carpeta",
    "senyalètica", "envàs", "packaging", "etiqueta", "interfície", "ui", "ux", "experiència",
    "wireframe", "prototip", "navegació", "menú", "botó", "crida", "acció", "cta", "responsive",
    "adaptatiu", "accessibilitat", "usabilitat", "test",
];

static TECHNICAL: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| TECHNICAL_TERMS_CA.iter().copied().collect());

static SPECIFIC: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| SPECIFIC_TERMS_CA.iter().copied().collect());

/// Which vocabulary to match against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lexicon {
    /// General design knowledge
    Technical,
    /// Concrete, specialist terms
    Specific,
}

impl Lexicon {
    pub fn contains(&self, token: &str) -> bool {
        match self {
            Lexicon::Technical => TECHNICAL.contains(token),
            Lexicon::Specific => SPECIFIC.contains(token),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Lexicon::Technical => TECHNICAL.len(),
            Lexicon::Specific => SPECIFIC.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Percentage of `tokens` found in this vocabulary; 0.0 for no tokens.
    pub fn coverage_pct(&self, tokens: &[String]) -> f64 {
        if tokens.is_empty() {
            return 0.0;
        }
        let hits = tokens.iter().filter(|t| self.contains(t)).count();
        100.0 * hits as f64 / tokens.len() as f64
    }
}
