mod forklift_edit;
mod forklift_list;

pub use forklift_edit::ForkliftEditScreen;
pub use forklift_list::ForkliftListScreen;
