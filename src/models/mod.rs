mod cart;
mod notification;
mod order;
mod product;
mod user;

pub use cart::*;
pub use notification::*;
pub use order::*;
pub use product::*;
pub use user::*;
