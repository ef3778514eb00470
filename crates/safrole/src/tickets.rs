// Path: crates/safrole/src/tickets.rs

//! Ticket accumulation and the outside-in sequencer.
//!
//! During the contest prefix of each epoch, validators submit lottery
//! tickets; accepted tickets accumulate in ascending identifier order. At
//! the contest tail the accumulator freezes, and if it holds a full epoch
//! of tickets they become the next epoch's sealing sequence, reordered
//! outside-in so consecutive slots alternate between the strongest and
//! weakest entries.

use marmalade_types::block::TicketBody;
use marmalade_types::error::TicketError;

/// Inserts accepted tickets into the accumulator, keeping it sorted,
/// deduplicated, and truncated to `capacity` (the epoch length).
///
/// The incoming tickets must already be verified and strictly ascending by
/// identifier; duplicates against the accumulator are rejected rather than
/// silently dropped so a block carrying them is invalid as a whole.
pub fn accumulate(
    accumulator: &mut Vec<TicketBody>,
    accepted: &[TicketBody],
    capacity: usize,
) -> Result<(), TicketError> {
    for window in accepted.windows(2) {
        if window[1].id <= window[0].id {
            return Err(TicketError::BadTicketOrder);
        }
    }
    for ticket in accepted {
        match accumulator.binary_search_by(|probe| probe.id.cmp(&ticket.id)) {
            Ok(_) => return Err(TicketError::DuplicateTicket),
            Err(position) => {
                if position >= capacity {
                    // The accumulator is full of stronger tickets; this one
                    // could never seal a slot.
                    return Err(TicketError::UnexpectedTicket(
                        "ticket does not improve a full accumulator".into(),
                    ));
                }
                accumulator.insert(position, *ticket);
            }
        }
    }
    accumulator.truncate(capacity);
    Ok(())
}

/// The outside-in sequencer `Z`: even positions walk the sequence from the
/// front, odd positions from the back.
pub fn outside_in(sequence: &[TicketBody]) -> Vec<TicketBody> {
    let len = sequence.len();
    (0..len)
        .map(|i| {
            if i % 2 == 0 {
                sequence[i / 2]
            } else {
                sequence[len - 1 - i / 2]
            }
        })
        .collect()
}

/// The inverse of [`outside_in`].
pub fn outside_in_inverse(sequence: &[TicketBody]) -> Vec<TicketBody> {
    let len = sequence.len();
    let mut out = vec![
        TicketBody {
            id: marmalade_types::primitives::OpaqueHash::ZERO,
            entry_index: 0,
        };
        len
    ];
    for (i, ticket) in sequence.iter().enumerate() {
        let position = if i % 2 == 0 { i / 2 } else { len - 1 - i / 2 };
        out[position] = *ticket;
    }
    out
}
