// Barcode images: symbol encoding, caption metrics, rasterization, and the
// per-file generation loop.

pub mod generator;
pub mod metrics;
pub mod render;
pub mod symbology;

pub use generator::{BarcodeGenerator, GenerationReport};
pub use render::{load_caption_font, WriterOptions};
pub use symbology::{SymbolEncoder, UpcA};
