//! Status and type enums shared across entities, services and handlers.
//!
//! Statuses are persisted as strings; the enums here own the transition
//! graphs. Every lifecycle service re-derives the current state from the
//! stored row on each call — there is no in-memory state machine instance.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use utoipa::ToSchema;

/// Sales order states.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Rejected,
    Processing,
    PreparingDo,
    PreparingToShip,
    Shipping,
    Delivered,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Whether the status admits no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Rejected | Self::Completed | Self::Cancelled)
    }

    /// Position within the forward fulfillment walk, for statuses on it.
    fn fulfillment_rank(self) -> Option<u8> {
        match self {
            Self::Processing => Some(0),
            Self::PreparingDo => Some(1),
            Self::PreparingToShip => Some(2),
            Self::Shipping => Some(3),
            Self::Delivered => Some(4),
            Self::Completed => Some(5),
            _ => None,
        }
    }

    /// The full transition graph for sales orders.
    ///
    /// `pending -> {accepted, rejected}`, `accepted -> processing` (via DO
    /// conversion), then a monotonic forward walk through
    /// `processing -> preparing_do -> preparing_to_ship -> shipping ->
    /// delivered -> completed` (forward jumps allowed, never backward). Any
    /// non-terminal state may move to `cancelled`.
    pub fn can_transition(self, to: OrderStatus) -> bool {
        if to == Self::Cancelled {
            return !self.is_terminal();
        }
        if let (Some(from_rank), Some(to_rank)) = (self.fulfillment_rank(), to.fulfillment_rank()) {
            return to_rank > from_rank;
        }
        matches!(
            (self, to),
            (Self::Pending, Self::Accepted)
                | (Self::Pending, Self::Rejected)
                | (Self::Accepted, Self::Processing)
        )
    }

    /// Targets `advance_status` accepts; everything else is rejected before
    /// the graph is even consulted.
    pub fn advance_targets() -> &'static [OrderStatus] {
        &[
            Self::PreparingDo,
            Self::PreparingToShip,
            Self::Shipping,
            Self::Delivered,
            Self::Completed,
        ]
    }
}

/// Purchase order states. `delivered`, `rejected` and `cancelled` are terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, EnumIter, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PurchaseOrderStatus {
    Pending,
    Processing,
    Shipping,
    Delivered,
    Rejected,
    Cancelled,
}

impl PurchaseOrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Rejected | Self::Cancelled)
    }

    /// Purchase order transition graph. The `do_created` gate on
    /// `processing -> shipping` is enforced by the service on top of this.
    pub fn can_transition(self, to: PurchaseOrderStatus) -> bool {
        matches!(
            (self, to),
            (Self::Pending, Self::Processing)
                | (Self::Pending, Self::Rejected)
                | (Self::Pending, Self::Cancelled)
                | (Self::Processing, Self::Shipping)
                | (Self::Processing, Self::Cancelled)
                | (Self::Shipping, Self::Delivered)
        )
    }
}

/// Delivery order states: a DO is either awaiting delivery or delivered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Delivered,
}

/// Task states.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
}

/// Task categories. Picking/Packing are synthesized on purchase order
/// creation; OrderProcessing on sales order acceptance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Picking,
    Packing,
    QualityCheck,
    Shipping,
    OrderProcessing,
}

/// Task priorities.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, ToSchema,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
}

/// Formats a delivery order document number: `DO-YYYYMMDD-NNNN`.
///
/// `sequence` is the 1-based position within the calendar month; the caller
/// must have computed it under the same transaction as the insert it numbers.
pub fn format_do_number(date: DateTime<Utc>, sequence: u32) -> String {
    format!(
        "DO-{:04}{:02}{:02}-{:04}",
        date.year(),
        date.month(),
        date.day(),
        sequence
    )
}

/// First instant of the calendar month containing `date`, and of the next one.
/// Used to scope the monthly DO-number counter.
pub fn month_bounds(date: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date
        .date_naive()
        .with_day(1)
        .expect("day 1 always valid")
        .and_hms_opt(0, 0, 0)
        .expect("midnight always valid")
        .and_utc();
    let next = if start.month() == 12 {
        start
            .with_year(start.year() + 1)
            .and_then(|d| d.with_month(1))
    } else {
        start.with_month(start.month() + 1)
    }
    .expect("month arithmetic stays in range");
    (start, next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;
    use strum::IntoEnumIterator;

    #[test]
    fn order_forward_walk() {
        use OrderStatus::*;
        assert!(Pending.can_transition(Accepted));
        assert!(Pending.can_transition(Rejected));
        assert!(Accepted.can_transition(Processing));
        assert!(Processing.can_transition(PreparingDo));
        assert!(PreparingDo.can_transition(PreparingToShip));
        assert!(PreparingToShip.can_transition(Shipping));
        assert!(Shipping.can_transition(Delivered));
        assert!(Delivered.can_transition(Completed));
    }

    #[test]
    fn order_illegal_edges_rejected() {
        use OrderStatus::*;
        assert!(!Pending.can_transition(Delivered));
        assert!(!Pending.can_transition(Processing));
        assert!(!Accepted.can_transition(Shipping));
        assert!(!Shipping.can_transition(Processing));
        assert!(!Delivered.can_transition(Shipping));
        assert!(!Completed.can_transition(Cancelled));
        assert!(!Rejected.can_transition(Accepted));
        assert!(!Cancelled.can_transition(Pending));
    }

    #[test]
    fn fulfillment_walk_is_monotonic() {
        use OrderStatus::*;
        // Forward jumps are legal, backward moves never are.
        assert!(Processing.can_transition(Shipping));
        assert!(Processing.can_transition(Completed));
        assert!(!PreparingToShip.can_transition(PreparingDo));
        assert!(!Completed.can_transition(Delivered));
    }

    #[test]
    fn any_non_terminal_order_can_cancel() {
        for status in OrderStatus::iter() {
            assert_eq!(
                status.can_transition(OrderStatus::Cancelled),
                !status.is_terminal(),
                "cancel from {status}"
            );
        }
    }

    #[test]
    fn status_round_trips_through_strings() {
        for status in OrderStatus::iter() {
            let parsed: OrderStatus = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert_eq!(OrderStatus::PreparingDo.to_string(), "preparing_do");
        assert_eq!(TaskStatus::InProgress.to_string(), "in_progress");
    }

    #[test]
    fn purchase_order_graph() {
        use PurchaseOrderStatus::*;
        assert!(Pending.can_transition(Processing));
        assert!(Pending.can_transition(Rejected));
        assert!(Pending.can_transition(Cancelled));
        assert!(Processing.can_transition(Shipping));
        assert!(Processing.can_transition(Cancelled));
        assert!(Shipping.can_transition(Delivered));

        assert!(!Shipping.can_transition(Cancelled));
        assert!(!Delivered.can_transition(Cancelled));
        assert!(!Cancelled.can_transition(Pending));
        assert!(!Rejected.can_transition(Processing));
        assert!(!Pending.can_transition(Shipping));
    }

    #[test]
    fn do_number_format() {
        let date = Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap();
        assert_eq!(format_do_number(date, 1), "DO-20240307-0001");
        assert_eq!(format_do_number(date, 42), "DO-20240307-0042");
    }

    #[test]
    fn month_bounds_cover_december() {
        let date = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        let (start, next) = month_bounds(date);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 12, 1, 0, 0, 0).unwrap());
        assert_eq!(next, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }

    proptest! {
        /// Terminal states never admit an outgoing edge, whatever the target.
        #[test]
        fn terminal_states_are_sinks(from_idx in 0usize..10, to_idx in 0usize..10) {
            let all: Vec<OrderStatus> = OrderStatus::iter().collect();
            let from = all[from_idx];
            let to = all[to_idx];
            if from.is_terminal() {
                prop_assert!(!from.can_transition(to));
            }
        }
    }
}
