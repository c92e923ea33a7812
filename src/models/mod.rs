pub mod board;
pub mod group;
pub mod image;
pub mod loaders;

pub use board::Board;
pub use group::Group;
pub use image::{BoardImage, ImageSource};
pub use loaders::{load_images_from_folder, LoadedImage};
