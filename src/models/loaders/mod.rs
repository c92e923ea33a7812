pub mod folder_loader;

pub use folder_loader::{load_image_file, load_images_from_folder, LoadedImage};
