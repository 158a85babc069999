pub mod completion;
pub mod payment;
pub mod reservation;
pub mod ticket;
pub mod ticket_scan;
pub mod ticket_type;
