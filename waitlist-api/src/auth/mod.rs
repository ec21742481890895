mod extractor;
mod token;

pub use extractor::Admin;
pub use token::AdminToken;
