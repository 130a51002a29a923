mod collection_list;
mod collection_view;
mod navigation;

pub use collection_list::CollectionListScreen;
pub use collection_view::CollectionScreen;
pub use navigation::NavigationBar;
