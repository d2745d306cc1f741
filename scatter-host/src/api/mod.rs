pub mod frames;
pub mod portal;
pub mod stream;
