pub mod account;
mod lenient;
pub mod ticket;

pub use account::{Account, StoredPassword};
pub use ticket::{NewTicket, Priority, Ticket, TicketStatus};
