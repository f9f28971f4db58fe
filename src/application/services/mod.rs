pub mod rate_limiter;
pub mod renderer;
pub mod resolver;
pub mod transport;
