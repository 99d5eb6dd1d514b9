//! Request and bid portfolios published by facilities each timestep.
//!
//! A request portfolio groups the requests of one facility behind a single target
//! quantity; a bid portfolio groups one facility's offers behind a shared set of capacity
//! constraints. Portfolios are the domain-facing face of the exchange — the translation
//! layer turns them into graph structure.
use super::ExchangeError;
use crate::agent::AgentID;
use crate::commodity::CommodityID;
use crate::resource::Resource;
use std::collections::HashSet;
use std::rc::Rc;

/// Preference assigned to requests that do not express one
pub const DEFAULT_PREFERENCE: f64 = 1.0;

/// Converts a resource to the quantity of some constraint dimension it consumes per unit
/// traded
pub type Converter = Box<dyn Fn(&Resource) -> f64>;

/// A capacity budget together with the rule for how traded resources consume it
pub struct CapacityConstraint {
    /// The budget available over one resolution
    pub capacity: f64,
    converter: Converter,
}

impl CapacityConstraint {
    /// Create a constraint with `capacity` units of budget
    pub fn new(capacity: f64, converter: Converter) -> Self {
        Self {
            capacity,
            converter,
        }
    }

    /// The amount of this constraint's budget consumed per unit of `resource` traded
    pub fn convert(&self, resource: &Resource) -> f64 {
        (self.converter)(resource)
    }
}

/// A single demand for a commodity
#[derive(Debug)]
pub struct Request {
    /// The commodity demanded
    pub commodity: CommodityID,
    /// A resource standing in for what the requester would like, including its quantity
    pub exemplar: Resource,
    /// Relative preference among the portfolio's requests; higher is matched first
    pub preference: f64,
    /// The requesting facility
    pub requester: AgentID,
}

/// Requests sharing a requester and one overall target quantity.
///
/// At most the target quantity is traded across all of the portfolio's requests combined,
/// however many of them receive bids.
pub struct RequestPortfolio {
    requester: AgentID,
    qty: f64,
    requests: Vec<Rc<Request>>,
    constraints: Vec<CapacityConstraint>,
    exclusive: bool,
}

impl RequestPortfolio {
    /// Create an empty portfolio requesting `qty` units in total
    pub fn new(requester: AgentID, qty: f64) -> Self {
        Self {
            requester,
            qty,
            requests: Vec::new(),
            constraints: Vec::new(),
            exclusive: false,
        }
    }

    /// Add a request for `exemplar`'s worth of `commodity`
    pub fn add_request(
        &mut self,
        commodity: CommodityID,
        exemplar: Resource,
        preference: f64,
    ) -> Rc<Request> {
        let request = Rc::new(Request {
            commodity,
            exemplar,
            preference,
            requester: self.requester.clone(),
        });
        self.requests.push(Rc::clone(&request));
        request
    }

    /// Add a capacity constraint shared by all of the portfolio's requests
    pub fn add_constraint(&mut self, constraint: CapacityConstraint) {
        self.constraints.push(constraint);
    }

    /// Mark the portfolio's requests as mutually exclusive: each arc serving them must
    /// trade the full outstanding quantity or nothing
    pub fn make_exclusive(&mut self) {
        self.exclusive = true;
    }

    /// The requesting facility
    pub fn requester(&self) -> &AgentID {
        &self.requester
    }

    /// The total quantity requested
    pub fn qty(&self) -> f64 {
        self.qty
    }

    /// The portfolio's requests in insertion order
    pub fn requests(&self) -> &[Rc<Request>] {
        &self.requests
    }

    /// The portfolio's shared capacity constraints
    pub fn constraints(&self) -> &[CapacityConstraint] {
        &self.constraints
    }

    /// Whether the portfolio's requests are mutually exclusive
    pub fn is_exclusive(&self) -> bool {
        self.exclusive
    }
}

/// An offer to supply a resource against a specific request
pub struct Bid {
    /// The request this bid answers
    pub request: Rc<Request>,
    /// The resource on offer, including the quantity offered
    pub offer: Resource,
    /// The bidding facility
    pub bidder: AgentID,
}

/// Bids from one bidder, sharing a set of capacity constraints.
///
/// The portfolio adopts the first bid's bidder; later bids must come from the same
/// facility, and no request may be bid on twice within one portfolio.
#[derive(Default)]
pub struct BidPortfolio {
    bidder: Option<AgentID>,
    bids: Vec<Rc<Bid>>,
    constraints: Vec<CapacityConstraint>,
    answered: HashSet<*const Request>,
}

impl BidPortfolio {
    /// Create an empty portfolio
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an offer of `offer` against `request`
    pub fn add_bid(
        &mut self,
        bidder: AgentID,
        request: &Rc<Request>,
        offer: Resource,
    ) -> Result<Rc<Bid>, ExchangeError> {
        if let Some(expected) = &self.bidder {
            if *expected != bidder {
                return Err(ExchangeError::BidderMismatch {
                    expected: expected.to_string(),
                    actual: bidder.to_string(),
                });
            }
        }
        if !self.answered.insert(Rc::as_ptr(request)) {
            return Err(ExchangeError::DuplicateRequest);
        }

        self.bidder = Some(bidder.clone());
        let bid = Rc::new(Bid {
            request: Rc::clone(request),
            offer,
            bidder,
        });
        self.bids.push(Rc::clone(&bid));
        Ok(bid)
    }

    /// Add a capacity constraint shared by all of the portfolio's bids
    pub fn add_constraint(&mut self, constraint: CapacityConstraint) {
        self.constraints.push(constraint);
    }

    /// The bidding facility, once the first bid has been added
    pub fn bidder(&self) -> Option<&AgentID> {
        self.bidder.as_ref()
    }

    /// The portfolio's bids in insertion order
    pub fn bids(&self) -> &[Rc<Bid>] {
        &self.bids
    }

    /// The portfolio's shared capacity constraints
    pub fn constraints(&self) -> &[CapacityConstraint] {
        &self.constraints
    }
}
