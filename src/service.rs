/// Registering videos, counting views and reading them back.
pub mod video;
