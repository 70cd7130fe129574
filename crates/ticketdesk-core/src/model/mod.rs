pub mod ticket;

pub use ticket::{
    MAX_DESCRIPTION_CHARS, ParseEnumError, Priority, Status, Ticket, TicketDraft, TicketId,
    ValidationError,
};
