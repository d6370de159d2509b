//! Task models: tokenizer, candle T5 decoder and the loading path

mod backend;
mod handle;
mod loader;
pub(crate) mod tokenizer;

pub use backend::{Seq2SeqBackend, T5Backend};
pub use handle::ModelHandle;
pub use loader::{load_model_handle, parse_dtype, resolve_model_files, select_device, ModelFiles};
pub use tokenizer::{EncodedPrompt, TaskTokenizer};
