pub mod compression;
pub mod import_step;
pub mod manifest;
pub mod registry;
pub mod validator;
