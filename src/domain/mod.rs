pub mod item;
pub mod stream;

pub use item::FeedItem;
pub use stream::UserStreams;
