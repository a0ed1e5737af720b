
use std::fmt;

use crate::crypto_params::{CryptoParams, NegotiationRole};
use crate::error::{Error, Result};

/// FilterState tracks the SDES offer/answer exchange.
///
/// Keys are usable in `Active`, while an updated offer is pending
/// (`Offered { renegotiating: true, .. }`) and after a provisional answer
/// that carried crypto.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum FilterState {
    #[default]
    Idle,
    Offered {
        by: NegotiationRole,
        renegotiating: bool,
    },
    ProvisionallyAnswered {
        by: NegotiationRole,
        with_crypto: bool,
    },
    Active,
}

impl FilterState {
    pub fn is_active(&self) -> bool {
        match *self {
            FilterState::Idle => false,
            FilterState::Offered { renegotiating, .. } => renegotiating,
            FilterState::ProvisionallyAnswered { with_crypto, .. } => with_crypto,
            FilterState::Active => true,
        }
    }
}

impl fmt::Display for FilterState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            FilterState::Idle => write!(f, "idle"),
            FilterState::Offered {
                by,
                renegotiating: false,
            } => write!(f, "{by}-offer"),
            FilterState::Offered {
                by,
                renegotiating: true,
            } => write!(f, "{by}-updated-offer"),
            FilterState::ProvisionallyAnswered {
                by,
                with_crypto: true,
            } => write!(f, "{by}-pranswer"),
            FilterState::ProvisionallyAnswered {
                by,
                with_crypto: false,
            } => write!(f, "{by}-pranswer-no-crypto"),
            FilterState::Active => write!(f, "active"),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum NegotiationOp {
    Offer,
    ProvisionalAnswer,
    Answer,
}

impl fmt::Display for NegotiationOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            NegotiationOp::Offer => write!(f, "offer"),
            NegotiationOp::ProvisionalAnswer => write!(f, "pranswer"),
            NegotiationOp::Answer => write!(f, "answer"),
        }
    }
}

/// Returns the state reached by applying `op` from `role`. `with_crypto`
/// tells whether the params list carried any entry; an answer without
/// crypto ends the session.
pub(crate) fn check_next_filter_state(
    cur: FilterState,
    op: NegotiationOp,
    role: NegotiationRole,
    with_crypto: bool,
) -> Result<FilterState> {
    match (cur, op) {
        // idle->offer, active->updated offer
        (FilterState::Idle, NegotiationOp::Offer) => {
            return Ok(FilterState::Offered {
                by: role,
                renegotiating: false,
            });
        }
        (FilterState::Active, NegotiationOp::Offer) => {
            return Ok(FilterState::Offered {
                by: role,
                renegotiating: true,
            });
        }
        // the offerer may refresh its offer
        (FilterState::Offered { by, .. }, NegotiationOp::Offer) if by == role => {
            return Ok(cur);
        }
        (FilterState::Offered { by, .. }, NegotiationOp::ProvisionalAnswer) if by != role => {
            return Ok(FilterState::ProvisionallyAnswered {
                by: role,
                with_crypto,
            });
        }
        (FilterState::Offered { by, .. }, NegotiationOp::Answer) if by != role => {
            return Ok(final_state(with_crypto));
        }
        (FilterState::ProvisionallyAnswered { by, .. }, NegotiationOp::Answer) if by == role => {
            return Ok(final_state(with_crypto));
        }
        _ => {}
    }

    Err(Error::IllegalTransition(format!("{role} {op} in state {cur}")))
}

fn final_state(with_crypto: bool) -> FilterState {
    if with_crypto {
        FilterState::Active
    } else {
        FilterState::Idle
    }
}

/// Picks the offered entry accepted by a non-empty answer. The answer must
/// carry exactly one entry, matching an offered entry on tag and suite.
pub(crate) fn select_proposal<'a>(
    offer: &'a [CryptoParams],
    answer: &[CryptoParams],
) -> Result<&'a CryptoParams> {
    let accepted = match answer {
        [accepted] => accepted,
        _ => return Err(Error::TooManyAnswerParams(answer.len())),
    };

    offer
        .iter()
        .find(|offered| accepted.matches(offered))
        .ok_or(Error::NoMatchingProposal)
}
