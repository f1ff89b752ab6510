pub mod health;
pub mod notification;
pub mod history;
pub mod diagnostics;

pub use health::*;
pub use notification::*;
pub use history::*;
pub use diagnostics::*;
