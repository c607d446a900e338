pub mod compose;
pub mod differ;
pub mod dispatch;
pub mod logging;
pub mod router;
pub mod scout;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
pub mod traits;
