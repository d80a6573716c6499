// src/engine/mod.rs - Matching Engine Coordinator
//! # Matching Engine
//!
//! Multi-symbol coordinator over the per-symbol order books: owns the
//! registry of live orders, allocates order and trade identifiers, enforces
//! per-symbol serialization, and fans completed trade batches out to the
//! trade repository and registered listeners.
//!
//! ## Concurrency
//!
//! Every operation on a symbol runs under that symbol's exclusion - the
//! mutex wrapping its [`OrderBook`], created on first touch and never
//! removed. Within one symbol all operations are totally ordered by the
//! acquire order of that mutex; across symbols there is no ordering
//! guarantee. Identifier allocation is monotonic but interleaved across
//! symbols.
//!
//! The trade repository and listeners are called strictly after the symbol
//! exclusion is released, so a listener that re-enters the engine cannot
//! deadlock; it must tolerate observing state that has already moved on.

pub mod matching;
pub mod validator;

pub use matching::{BookLevel, OrderBook, OrderBookSide, OrderRef, PriceLevel};

use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::core::order::{ModifyOrderRequest, NewOrderRequest, Order};
use crate::core::types::{
    OrderId, OrderType, Side, Symbol, TimeInForce, Trade, INVALID_ORDER_ID,
};
use crate::storage::TradeRepository;
use crate::util::{Clock, IdGenerator};

/// Callback invoked with each completed trade batch, outside the symbol
/// exclusion, in registration order.
pub type TradeListener = Arc<dyn Fn(&[Trade]) + Send + Sync>;

/// Multi-symbol limit-order matching engine.
///
/// The engine owns every live order through its registry; books hold shared
/// handles whose validity follows from the registry only dropping an order
/// under the same symbol exclusion after it has left (or never reached) the
/// book.
pub struct MatchingEngine {
    /// Per-symbol books; the wrapping mutex is the symbol exclusion.
    books: DashMap<Symbol, Arc<Mutex<OrderBook>>>,
    /// Live orders by id. Sole owner of order storage.
    registry: DashMap<OrderId, OrderRef>,
    clock: Arc<dyn Clock>,
    trade_repo: Arc<dyn TradeRepository>,
    order_ids: IdGenerator,
    trade_ids: IdGenerator,
    listeners: RwLock<Vec<TradeListener>>,
}

impl MatchingEngine {
    /// Create an engine wired to a clock and a trade repository.
    pub fn new(clock: Arc<dyn Clock>, trade_repo: Arc<dyn TradeRepository>) -> Self {
        info!("initializing matching engine");
        Self {
            books: DashMap::new(),
            registry: DashMap::new(),
            clock,
            trade_repo,
            order_ids: IdGenerator::new(),
            trade_ids: IdGenerator::new(),
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Submit a new order.
    ///
    /// Returns the assigned order id, or [`INVALID_ORDER_ID`] when the
    /// request fails validation. The id is returned even when the order has
    /// already left the registry (fully filled, or non-GTC with surplus).
    pub fn new_order(&self, req: &NewOrderRequest) -> OrderId {
        if let Err(reason) = validator::validate_new_order(req) {
            warn!(symbol = %req.symbol, %reason, "new order rejected");
            return INVALID_ORDER_ID;
        }

        let book = self.get_or_create_book(&req.symbol);
        let mut book_guard = book.lock();

        let order_id = self.order_ids.next();
        let mut order = Order::from_request(order_id, req, self.clock.now());
        // market orders never rest, so a market GTC degrades to IOC
        if order.order_type == OrderType::Market && order.tif == TimeInForce::GoodTilCanceled {
            order.tif = TimeInForce::ImmediateOrCancel;
        }
        let tif = order.tif;
        debug!(order_id, symbol = %order.symbol, side = %order.side,
               order_type = %order.order_type, %tif, price = order.price,
               quantity = order.qty, "order accepted");

        let order_ref: OrderRef = Arc::new(Mutex::new(order));
        self.registry.insert(order_id, Arc::clone(&order_ref));

        let mut trades = book_guard.submit_order(&order_ref);

        let remaining = order_ref.lock().remaining;
        if tif != TimeInForce::GoodTilCanceled && remaining > 0 {
            // never reached the book; the surplus is gone with it
            self.registry.remove(&order_id);
        }
        if !trades.is_empty() {
            self.drop_filled_orders(&trades);
            self.stamp_trades(&mut trades);
        }
        drop(book_guard);

        self.publish_trades(&trades);
        order_id
    }

    /// Cancel a live order by id. Returns true when the order was removed
    /// from its book.
    pub fn cancel_order(&self, order_id: OrderId) -> bool {
        let symbol = match self.registry.get(&order_id) {
            Some(entry) => entry.value().lock().symbol.clone(),
            None => return false,
        };

        let book = self.get_or_create_book(&symbol);
        let mut book_guard = book.lock();

        // the order may have filled or been canceled while we waited
        let Some(order_ref) = self.registry.get(&order_id).map(|e| Arc::clone(e.value())) else {
            return false;
        };
        let snapshot = order_ref.lock().clone();

        if book_guard.cancel_order(&snapshot) {
            self.registry.remove(&order_id);
            debug!(order_id, symbol = %symbol, "order canceled");
            return true;
        }

        // housekeeping: a fully filled order has no book entry left to cancel
        if order_ref.lock().remaining == 0 {
            self.registry.remove(&order_id);
        }
        false
    }

    /// Amend a live order's price and/or quantity.
    ///
    /// A modify that leaves the order passive re-queues it at the tail of
    /// its (possibly new) level. A modify that makes the order aggressive -
    /// a price amend crossing the opposite best - cancels it and re-submits
    /// through the normal matching pipeline.
    pub fn modify_order(&self, order_id: OrderId, req: &ModifyOrderRequest) -> bool {
        let snapshot = match self.registry.get(&order_id) {
            Some(entry) => entry.value().lock().clone(),
            None => return false,
        };
        if let Err(reason) = validator::validate_modify_order(&snapshot, req) {
            warn!(order_id, %reason, "modify rejected");
            return false;
        }

        let book = self.get_or_create_book(&snapshot.symbol);
        let mut book_guard = book.lock();

        let Some(order_ref) = self.registry.get(&order_id).map(|e| Arc::clone(e.value())) else {
            return false;
        };
        let live = order_ref.lock().clone();
        // re-validate against live state; a concurrent fill may have raised
        // the filled quantity past the proposed total
        if let Err(reason) = validator::validate_modify_order(&live, req) {
            warn!(order_id, %reason, "modify rejected against live order");
            return false;
        }

        let new_price = req.new_price.unwrap_or(live.price);
        let mut will_rematch = live.order_type == OrderType::Market;
        if !will_rematch && req.new_price.is_some() {
            let opposite = match live.side {
                Side::Buy => book_guard.asks(),
                Side::Sell => book_guard.bids(),
            };
            if let Some(best_price) = opposite.best_price() {
                will_rematch = match live.side {
                    Side::Buy => new_price >= best_price,
                    Side::Sell => new_price <= best_price,
                };
            }
        }

        if !will_rematch {
            let modified = book_guard.modify_order(&order_ref, req);
            if modified && order_ref.lock().remaining == 0 {
                // amended down to exactly the filled quantity
                self.registry.remove(&order_id);
            }
            return modified;
        }

        let mut amended = live.clone();
        if let Some(price) = req.new_price {
            amended.price = price;
        }
        if let Some(qty) = req.new_quantity {
            amended.qty = qty;
        }
        amended.remaining = amended.qty - amended.filled;

        if amended.tif == TimeInForce::FillOrKill {
            let opposite = match amended.side {
                Side::Buy => book_guard.asks(),
                Side::Sell => book_guard.bids(),
            };
            if opposite.available_quantity(&amended) < amended.remaining {
                return false;
            }
        }

        if !book_guard.cancel_order(&live) {
            // no longer resting; presumably filled in the meantime
            if order_ref.lock().remaining == 0 {
                self.registry.remove(&order_id);
            }
            return false;
        }

        {
            let mut order = order_ref.lock();
            order.price = amended.price;
            order.qty = amended.qty;
            order.remaining = amended.remaining;
        }
        debug!(order_id, price = amended.price, quantity = amended.qty, "order rematching");

        let mut trades = Vec::new();
        if amended.remaining > 0 {
            trades = book_guard.submit_order(&order_ref);
        } else {
            self.registry.remove(&order_id);
        }
        if !trades.is_empty() {
            self.drop_filled_orders(&trades);
            self.stamp_trades(&mut trades);
        }
        drop(book_guard);

        self.publish_trades(&trades);
        true
    }

    /// Register a callback for completed trade batches.
    ///
    /// Listeners run sequentially, in registration order, after the symbol
    /// exclusion has been released.
    pub fn register_trade_listener(&self, listener: TradeListener) {
        self.listeners.write().push(listener);
    }

    /// Symbol of a live order, if the id is still registered.
    pub fn get_symbol_by_order(&self, order_id: OrderId) -> Option<Symbol> {
        self.registry
            .get(&order_id)
            .map(|entry| entry.value().lock().symbol.clone())
    }

    /// Snapshot of a live order, if the id is still registered.
    pub fn get_order(&self, order_id: OrderId) -> Option<Order> {
        self.registry
            .get(&order_id)
            .map(|entry| entry.value().lock().clone())
    }

    /// The book for `symbol`, created on first touch.
    ///
    /// Locking the returned mutex acquires the symbol's exclusion.
    pub fn get_or_create_book(&self, symbol: &str) -> Arc<Mutex<OrderBook>> {
        let entry = self
            .books
            .entry(symbol.to_owned())
            .or_insert_with(|| Arc::new(Mutex::new(OrderBook::new())));
        Arc::clone(entry.value())
    }

    /// Drop orders referenced by `trades` that have been completely filled.
    fn drop_filled_orders(&self, trades: &[Trade]) {
        let mut ids = HashSet::new();
        for trade in trades {
            if trade.buy_order_id != INVALID_ORDER_ID {
                ids.insert(trade.buy_order_id);
            }
            if trade.sell_order_id != INVALID_ORDER_ID {
                ids.insert(trade.sell_order_id);
            }
        }
        for id in ids {
            let filled = self
                .registry
                .get(&id)
                .is_some_and(|entry| entry.value().lock().remaining == 0);
            if filled {
                self.registry.remove(&id);
            }
        }
    }

    /// Assign fresh trade ids and the post-match clock reading to a batch.
    fn stamp_trades(&self, trades: &mut [Trade]) {
        let timestamp = self.clock.now();
        for trade in trades.iter_mut() {
            trade.trade_id = self.trade_ids.next();
            trade.timestamp = timestamp;
        }
    }

    /// Hand a completed batch to the repository, then to each listener.
    fn publish_trades(&self, trades: &[Trade]) {
        if trades.is_empty() {
            return;
        }
        self.trade_repo.add_trades(trades);

        let listeners: Vec<TradeListener> = self.listeners.read().clone();
        for listener in &listeners {
            listener(trades);
        }
    }
}
