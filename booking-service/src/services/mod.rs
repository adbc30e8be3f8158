pub mod memory;
pub mod razorpay;
pub mod repository;

pub use memory::InMemoryBookingStore;
pub use razorpay::RazorpayClient;
pub use repository::{BookingStore, PgBookingStore};
