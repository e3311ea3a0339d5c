pub mod base64_decoder;
