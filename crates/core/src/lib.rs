pub mod code_buffer;
pub mod config;
pub mod error;
pub mod templates;
pub mod types;

pub use code_buffer::{CodeBlock, CodeBuffer, CodeSink};
pub use config::{ConfigResolver, GoogleConfig, TrackingConfig};
pub use error::{TrackingError, TrackingResult};
pub use templates::{Renderer, TemplateRenderer};
pub use types::{Cart, CheckoutStep, ItemId, Order, Product};
