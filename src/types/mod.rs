pub mod clock;
pub mod reading;
pub mod record;
