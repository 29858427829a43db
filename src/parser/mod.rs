pub mod headings;
pub mod normalize;
pub mod outline;
pub mod tokenize;

pub use headings::extract as extract_heading;
pub use normalize::clean_text;
