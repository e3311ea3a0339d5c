pub mod dto;
pub mod model_cache;
pub mod ports;
pub mod services;
pub mod session;

#[cfg(test)]
pub mod testing;
