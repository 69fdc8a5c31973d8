pub mod codec;
pub mod http;
pub mod onnx;
pub mod render;
