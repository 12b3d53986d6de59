//! # Fulfillment Transition Table
//!
//! The pure state machine driving an order across its two status axes.
//!
//! ## The Two Axes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  status (customer-facing)        fulfillment_status (operational)       │
//! │                                                                         │
//! │  Recibido                        No preparado                           │
//! │     │  assign dispatcher            │                                   │
//! │     │  (status unchanged)           ▼                                   │
//! │     │                            En preparación                         │
//! │     │  complete picking             │                                   │
//! │     ▼                              ▼                                    │
//! │  Listo para recoger             Listo para despacho                     │
//! │     │                           / Listo con faltantes                   │
//! │     │  assign rider               │                                     │
//! │     ▼                             ▼                                     │
//! │  En camino                      En ruta                                 │
//! │     │  mark delivered             │                                     │
//! │     ▼                             ▼                                     │
//! │  Entregado                      Entregado                               │
//! │                                                                         │
//! │  Alternates: Cancelado (both axes), Devuelto (status only)              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The two enums are deliberately separate fields updated through this one
//! table — some events move both, some move one. A partially-fulfillable
//! order (`Listo con faltantes`) is still presented to logistics as ready.
//!
//! This module is pure: it decides the next state and which timestamp to
//! stamp; the engine layer owns the side effects (ledger entries, id
//! assignment) and applies everything in one store transaction. An illegal
//! event returns a typed error and implies no change at all.

use crate::error::{CoreError, CoreResult};
use crate::types::{FulfillmentStatus, OrderStatus};

// =============================================================================
// Events
// =============================================================================

/// A fulfillment event requested by back-office staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FulfillmentEvent {
    /// Dispatcher takes the order for picking.
    AssignDispatcher,

    /// Dispatcher reports picking finished; `any_missing` is true when at
    /// least one item could not be found on the shelves.
    CompletePicking { any_missing: bool },

    /// Rider takes the order for delivery.
    AssignRider,

    /// Rider hands the order to the customer.
    MarkDelivered,

    /// Order is cancelled.
    Cancel,

    /// A return is processed against the (delivered) order.
    ProcessReturn,
}

impl FulfillmentEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            FulfillmentEvent::AssignDispatcher => "assign dispatcher",
            FulfillmentEvent::CompletePicking { .. } => "complete picking",
            FulfillmentEvent::AssignRider => "assign rider",
            FulfillmentEvent::MarkDelivered => "mark delivered",
            FulfillmentEvent::Cancel => "cancel",
            FulfillmentEvent::ProcessReturn => "process return",
        }
    }
}

// =============================================================================
// Transition Result
// =============================================================================

/// Which order timestamp a transition records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionStamp {
    Assigned,
    PickedUp,
    Delivered,
}

/// The outcome of a legal transition: the new pair of statuses plus the
/// timestamp to record, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub status: OrderStatus,
    pub fulfillment: FulfillmentStatus,
    pub stamp: Option<TransitionStamp>,
}

// =============================================================================
// The Table
// =============================================================================

/// Applies a fulfillment event to the current state pair.
///
/// Returns the resulting state pair, or `CoreError::InvalidTransition` when
/// the event is not legal from the current state. Callers must treat an
/// error as a strict no-op.
pub fn apply_event(
    status: OrderStatus,
    fulfillment: FulfillmentStatus,
    event: FulfillmentEvent,
) -> CoreResult<Transition> {
    let rejected = || {
        Err(CoreError::InvalidTransition {
            status: status.as_str(),
            fulfillment: fulfillment.as_str(),
            event: event.as_str(),
        })
    };

    match event {
        // Picking can only start on an untouched order. The customer-facing
        // status stays Recibido; only the operational axis moves.
        FulfillmentEvent::AssignDispatcher => match fulfillment {
            FulfillmentStatus::NoPreparado => Ok(Transition {
                status,
                fulfillment: FulfillmentStatus::EnPreparacion,
                stamp: Some(TransitionStamp::Assigned),
            }),
            _ => rejected(),
        },

        // Both axes move: the customer sees "Listo para recoger" whether or
        // not items were missing — a partially-fulfillable order still goes
        // out. Missing items are reported by the engine as negative
        // adjustments in the same transaction.
        FulfillmentEvent::CompletePicking { any_missing } => match fulfillment {
            FulfillmentStatus::EnPreparacion => Ok(Transition {
                status: OrderStatus::ListoParaRecoger,
                fulfillment: if any_missing {
                    FulfillmentStatus::ListoConFaltantes
                } else {
                    FulfillmentStatus::ListoParaDespacho
                },
                stamp: None,
            }),
            _ => rejected(),
        },

        // A rider may only take a picked order, complete or with missing
        // items; anything else is rejected outright.
        FulfillmentEvent::AssignRider => {
            if fulfillment.is_ready_for_dispatch() {
                Ok(Transition {
                    status: OrderStatus::EnCamino,
                    fulfillment: FulfillmentStatus::EnRuta,
                    stamp: Some(TransitionStamp::PickedUp),
                })
            } else {
                rejected()
            }
        }

        FulfillmentEvent::MarkDelivered => match fulfillment {
            FulfillmentStatus::EnRuta => Ok(Transition {
                status: OrderStatus::Entregado,
                fulfillment: FulfillmentStatus::Entregado,
                stamp: Some(TransitionStamp::Delivered),
            }),
            _ => rejected(),
        },

        FulfillmentEvent::Cancel => {
            if status.is_terminal() {
                rejected()
            } else {
                Ok(Transition {
                    status: OrderStatus::Cancelado,
                    fulfillment: FulfillmentStatus::Cancelado,
                    stamp: None,
                })
            }
        }

        // Devuelto overrides whatever customer-facing status held before;
        // the operational axis is left where the order finished.
        FulfillmentEvent::ProcessReturn => match status {
            OrderStatus::Cancelado | OrderStatus::Devuelto => rejected(),
            _ => Ok(Transition {
                status: OrderStatus::Devuelto,
                fulfillment,
                stamp: None,
            }),
        },
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const FRESH: (OrderStatus, FulfillmentStatus) =
        (OrderStatus::Recibido, FulfillmentStatus::NoPreparado);

    #[test]
    fn test_assign_dispatcher_moves_only_fulfillment() {
        let t = apply_event(FRESH.0, FRESH.1, FulfillmentEvent::AssignDispatcher).unwrap();
        assert_eq!(t.status, OrderStatus::Recibido);
        assert_eq!(t.fulfillment, FulfillmentStatus::EnPreparacion);
        assert_eq!(t.stamp, Some(TransitionStamp::Assigned));
    }

    #[test]
    fn test_assign_dispatcher_only_from_no_preparado() {
        let err = apply_event(
            OrderStatus::Recibido,
            FulfillmentStatus::EnPreparacion,
            FulfillmentEvent::AssignDispatcher,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
    }

    #[test]
    fn test_complete_picking_all_found() {
        let t = apply_event(
            OrderStatus::Recibido,
            FulfillmentStatus::EnPreparacion,
            FulfillmentEvent::CompletePicking { any_missing: false },
        )
        .unwrap();
        assert_eq!(t.status, OrderStatus::ListoParaRecoger);
        assert_eq!(t.fulfillment, FulfillmentStatus::ListoParaDespacho);
    }

    #[test]
    fn test_complete_picking_with_missing_items() {
        let t = apply_event(
            OrderStatus::Recibido,
            FulfillmentStatus::EnPreparacion,
            FulfillmentEvent::CompletePicking { any_missing: true },
        )
        .unwrap();
        // Still presented to logistics as ready.
        assert_eq!(t.status, OrderStatus::ListoParaRecoger);
        assert_eq!(t.fulfillment, FulfillmentStatus::ListoConFaltantes);
    }

    #[test]
    fn test_assign_rider_requires_picked_order() {
        for ready in [
            FulfillmentStatus::ListoParaDespacho,
            FulfillmentStatus::ListoConFaltantes,
        ] {
            let t = apply_event(
                OrderStatus::ListoParaRecoger,
                ready,
                FulfillmentEvent::AssignRider,
            )
            .unwrap();
            assert_eq!(t.status, OrderStatus::EnCamino);
            assert_eq!(t.fulfillment, FulfillmentStatus::EnRuta);
            assert_eq!(t.stamp, Some(TransitionStamp::PickedUp));
        }

        for not_ready in [
            FulfillmentStatus::NoPreparado,
            FulfillmentStatus::EnPreparacion,
            FulfillmentStatus::EnRuta,
            FulfillmentStatus::Entregado,
            FulfillmentStatus::Cancelado,
        ] {
            let err = apply_event(
                OrderStatus::Recibido,
                not_ready,
                FulfillmentEvent::AssignRider,
            )
            .unwrap_err();
            assert!(matches!(err, CoreError::InvalidTransition { .. }));
        }
    }

    #[test]
    fn test_mark_delivered_terminal() {
        let t = apply_event(
            OrderStatus::EnCamino,
            FulfillmentStatus::EnRuta,
            FulfillmentEvent::MarkDelivered,
        )
        .unwrap();
        assert_eq!(t.status, OrderStatus::Entregado);
        assert_eq!(t.fulfillment, FulfillmentStatus::Entregado);
        assert_eq!(t.stamp, Some(TransitionStamp::Delivered));

        // No further delivery from a delivered order.
        let err = apply_event(
            OrderStatus::Entregado,
            FulfillmentStatus::Entregado,
            FulfillmentEvent::MarkDelivered,
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));
    }

    #[test]
    fn test_cancel_from_non_terminal_states() {
        for status in [
            OrderStatus::Recibido,
            OrderStatus::EnPreparacion,
            OrderStatus::ListoParaRecoger,
            OrderStatus::EnCamino,
        ] {
            let t = apply_event(
                status,
                FulfillmentStatus::NoPreparado,
                FulfillmentEvent::Cancel,
            )
            .unwrap();
            assert_eq!(t.status, OrderStatus::Cancelado);
            assert_eq!(t.fulfillment, FulfillmentStatus::Cancelado);
        }

        for terminal in [
            OrderStatus::Entregado,
            OrderStatus::Cancelado,
            OrderStatus::Devuelto,
        ] {
            assert!(apply_event(
                terminal,
                FulfillmentStatus::Entregado,
                FulfillmentEvent::Cancel
            )
            .is_err());
        }
    }

    #[test]
    fn test_return_overrides_status_keeps_fulfillment() {
        let t = apply_event(
            OrderStatus::Entregado,
            FulfillmentStatus::Entregado,
            FulfillmentEvent::ProcessReturn,
        )
        .unwrap();
        assert_eq!(t.status, OrderStatus::Devuelto);
        assert_eq!(t.fulfillment, FulfillmentStatus::Entregado);

        // Not from cancelled or already-returned orders.
        assert!(apply_event(
            OrderStatus::Cancelado,
            FulfillmentStatus::Cancelado,
            FulfillmentEvent::ProcessReturn
        )
        .is_err());
        assert!(apply_event(
            OrderStatus::Devuelto,
            FulfillmentStatus::Entregado,
            FulfillmentEvent::ProcessReturn
        )
        .is_err());
    }

    /// The happy path walks both axes in lockstep through the whole pipeline.
    #[test]
    fn test_full_pipeline() {
        let mut status = OrderStatus::Recibido;
        let mut fulfillment = FulfillmentStatus::NoPreparado;

        for event in [
            FulfillmentEvent::AssignDispatcher,
            FulfillmentEvent::CompletePicking { any_missing: false },
            FulfillmentEvent::AssignRider,
            FulfillmentEvent::MarkDelivered,
        ] {
            let t = apply_event(status, fulfillment, event).unwrap();
            status = t.status;
            fulfillment = t.fulfillment;
        }

        assert_eq!(status, OrderStatus::Entregado);
        assert_eq!(fulfillment, FulfillmentStatus::Entregado);
    }
}
