use layout_store::LayoutState;
use shared::error::CoreError;
use topology::{LocationRef, Topology, ANY_STACK, ANY_STOP};
use tracing::info;

use super::expect_track;
use crate::{
    args::{ArgKind, ArgSpec, Args},
    registry::{CommandContext, CommandHandler, Outcome},
};

/// `MOVEPLATE sourceId,destId[,routeHint]`: relocates the accessible plate
/// at the source, keeping its id.
///
/// Checks run in a fixed order and the first failure wins: the source
/// must hold a plate, the destination must have a free slot, and a route
/// must exist (through `routeHint` when given). `destId` may be
/// `ANY_STOP` or `ANY_STACK`, resolved in configuration order. Naming the
/// location the plate already occupies succeeds without moving it.
pub struct MovePlate;

const SCHEMA: &[ArgSpec] = &[
    ArgSpec::required("source", ArgKind::Location),
    ArgSpec::required("dest", ArgKind::Location),
    ArgSpec::optional("route", ArgKind::Location),
];

enum Destination {
    Exact(LocationRef),
    AnyStop,
    AnyStack,
}

impl Destination {
    fn resolve(topology: &Topology, address: &str) -> Result<Self, CoreError> {
        match address {
            ANY_STOP => Ok(Destination::AnyStop),
            ANY_STACK => Ok(Destination::AnyStack),
            other => topology.resolve(other).map(Destination::Exact),
        }
    }

    /// A destination naming the container the plate already sits in, such
    /// as `K1,K1` or `T1,T1`. The plate stays put. A different slot of the
    /// same track is a real move.
    fn is_in_place(&self, source: LocationRef, from: LocationRef) -> bool {
        match self {
            Destination::Exact(target @ LocationRef::TrackSlot { .. }) => *target == from,
            Destination::Exact(target) => *target == source.node() || *target == from,
            _ => false,
        }
    }
}

struct Plan {
    target: LocationRef,
    route: Vec<LocationRef>,
}

impl CommandHandler for MovePlate {
    fn schema(&self) -> &'static [ArgSpec] {
        SCHEMA
    }

    fn execute(&self, args: &Args, ctx: &CommandContext<'_>) -> Result<Outcome, CoreError> {
        let topology = ctx.topology;
        let source = topology.resolve(args.location(0)?)?;
        let destination = Destination::resolve(topology, args.location(1)?)?;
        let via = args
            .optional_location(2)
            .map(|hint| expect_track(topology, hint).map(LocationRef::Track))
            .transpose()?;

        let (plate, from, landed, route) = ctx.store.transact(|state| {
            let (from, plate) = state.accessible(source).ok_or_else(|| {
                CoreError::not_found(format!("no plate at {}", topology.describe(source)))
            })?;
            if destination.is_in_place(source, from) {
                return Ok((plate, from, from, vec![from.node()]));
            }
            let plan = plan(state, source, &destination, via)?;

            state.remove(from)?;
            let landed = state.place(plan.target, plate)?;
            Ok((plate, from, landed, plan.route))
        })?;

        let from = topology.address_of(from);
        let to = topology.address_of(landed);
        let via: Vec<String> = route
            .iter()
            .skip(1)
            .take(route.len().saturating_sub(2))
            .map(|node| topology.address_of(*node))
            .collect();
        info!(%plate, %from, %to, hops = via.len(), "plate moved");

        if via.is_empty() {
            Ok(Outcome::detail(format!("{plate} {from}->{to}")))
        } else {
            Ok(Outcome::detail(format!(
                "{plate} {from}->{to} via {}",
                via.join(",")
            )))
        }
    }
}

fn plan(
    state: &LayoutState,
    source: LocationRef,
    destination: &Destination,
    via: Option<LocationRef>,
) -> Result<Plan, CoreError> {
    let topology = state.topology();
    let candidates: Vec<LocationRef> = match destination {
        Destination::Exact(target) => {
            let target = state.check_place(*target)?;
            let route = topology.route(source, target, via).ok_or_else(|| {
                CoreError::Unreachable(format!(
                    "no route from {} to {}{}",
                    topology.describe(source),
                    topology.describe(target),
                    via_suffix(topology, via)
                ))
            })?;
            return Ok(Plan { target, route });
        }
        Destination::AnyStop => (0..topology.stops().len()).map(LocationRef::Stop).collect(),
        Destination::AnyStack => (0..topology.stacks().len()).map(LocationRef::Stack).collect(),
    };

    let kind = match destination {
        Destination::AnyStack => "stack",
        _ => "stop",
    };
    if candidates.is_empty() {
        return Err(CoreError::not_found(format!("layout has no {kind}s")));
    }

    let mut first_refusal = None;
    let mut any_free = false;
    for candidate in candidates {
        if candidate == source.node() {
            continue;
        }
        let target = match state.check_place(candidate) {
            Ok(target) => target,
            Err(err) => {
                first_refusal.get_or_insert(err);
                continue;
            }
        };
        any_free = true;
        if let Some(route) = topology.route(source, target, via) {
            return Ok(Plan { target, route });
        }
    }

    if any_free {
        Err(CoreError::Unreachable(format!(
            "no free {kind} is reachable from {}{}",
            topology.describe(source),
            via_suffix(topology, via)
        )))
    } else {
        Err(first_refusal
            .unwrap_or_else(|| CoreError::not_found(format!("no other {kind} in the layout"))))
    }
}

fn via_suffix(topology: &Topology, via: Option<LocationRef>) -> String {
    via.map(|v| format!(" via {}", topology.address_of(v)))
        .unwrap_or_default()
}
