// src/engine/matching.rs - Price Levels, Book Sides and the Order Book
//! Per-symbol order book built from two price-sorted sides of FIFO levels.
//!
//! Matching walks the opposite side in price-time order: the best price
//! level first, and the oldest order within a level first. The incoming
//! order is the aggressor; the resting order sets the trade price. Orders
//! are shared between the engine registry and the levels as
//! [`OrderRef`] handles; every mutation here happens under the owning
//! symbol's exclusion, which the engine holds for the duration of a call.
//!
//! ```text
//! Ask (Sell) Side                    Bid (Buy) Side
//! Price  | Volume                    Price  | Volume
//! -------|-------                    -------|-------
//! 101.00 |    400                    100.00 |    300
//! 100.50 |    150  Best Ask/Bid      99.50  |    500
//! ```

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering as CmpOrdering;
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::core::order::{ModifyOrderRequest, Order};
use crate::core::types::{
    OrderId, OrderType, Price, Quantity, Side, TimeInForce, Trade, INVALID_TRADE_ID,
};

/// Shared handle to a working order.
///
/// The engine registry holds the canonical handle; price levels hold clones.
/// The per-order mutex covers snapshot reads taken outside the symbol
/// exclusion; all mutation happens under it.
pub type OrderRef = Arc<Mutex<Order>>;

/// Wrapper for Price to enable total ordering in the level maps.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct OrderedPrice(pub(crate) Price);

impl Eq for OrderedPrice {}

impl PartialOrd for OrderedPrice {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedPrice {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        self.0.partial_cmp(&other.0).unwrap_or(CmpOrdering::Equal)
    }
}

/// Public snapshot of one price level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BookLevel {
    /// Price of the level.
    pub price: Price,
    /// Sum of open quantity across the level's orders.
    pub volume: Quantity,
    /// Number of orders queued at the level.
    pub order_count: usize,
}

/// FIFO queue of orders at one price with a cached aggregate volume.
#[derive(Debug, Default)]
pub struct PriceLevel {
    price: Price,
    volume: Quantity,
    orders: VecDeque<OrderRef>,
}

impl PriceLevel {
    fn new(price: Price) -> Self {
        Self {
            price,
            volume: 0,
            orders: VecDeque::new(),
        }
    }

    /// Append an order to the tail of the queue. Orders with nothing open
    /// are ignored.
    fn add_order(&mut self, order: &OrderRef) {
        let remaining = order.lock().remaining;
        if remaining <= 0 {
            return;
        }
        self.orders.push_back(Arc::clone(order));
        self.volume += remaining;
    }

    /// The order at the head of the queue, if any.
    fn front(&self) -> Option<&OrderRef> {
        self.orders.front()
    }

    /// Pop the head order, reducing the cached volume by its open quantity.
    fn pop_front(&mut self) -> Option<OrderRef> {
        let order = self.orders.pop_front()?;
        self.volume -= order.lock().remaining;
        Some(order)
    }

    /// Remove the order with `order_id`, wherever it sits in the queue.
    fn remove_order(&mut self, order_id: OrderId) -> bool {
        if let Some(pos) = self
            .orders
            .iter()
            .position(|order| order.lock().order_id == order_id)
        {
            let order = self.orders.remove(pos).expect("position is within bounds");
            self.volume -= order.lock().remaining;
            true
        } else {
            false
        }
    }

    /// Reduce the cached volume after a fill against the head order.
    fn update_volume(&mut self, filled_qty: Quantity) {
        debug_assert!(
            filled_qty <= self.volume,
            "fill of {filled_qty} would make level volume negative"
        );
        self.volume -= filled_qty;
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Number of queued orders.
    pub fn len(&self) -> usize {
        self.orders.len()
    }

    /// Cached sum of open quantity across the queue.
    pub fn volume(&self) -> Quantity {
        self.volume
    }

    /// Price of this level.
    pub fn price(&self) -> Price {
        self.price
    }

    fn view(&self) -> BookLevel {
        BookLevel {
            price: self.price,
            volume: self.volume,
            order_count: self.orders.len(),
        }
    }

    #[cfg(test)]
    pub(crate) fn orders(&self) -> impl Iterator<Item = &OrderRef> {
        self.orders.iter()
    }
}

/// One side of a book: a price-ordered map of FIFO levels.
///
/// Best level is the lowest price for the ask side and the highest for the
/// bid side. Levels whose queue empties are pruned eagerly; lookups still
/// skip empty levels defensively.
#[derive(Debug)]
pub struct OrderBookSide {
    side: Side,
    levels: BTreeMap<OrderedPrice, PriceLevel>,
}

impl OrderBookSide {
    fn new(side: Side) -> Self {
        Self {
            side,
            levels: BTreeMap::new(),
        }
    }

    /// Which side of the book this is.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Levels from best to worst price.
    fn levels_best_first(&self) -> Box<dyn Iterator<Item = &PriceLevel> + '_> {
        match self.side {
            Side::Buy => Box::new(self.levels.values().rev()),
            Side::Sell => Box::new(self.levels.values()),
        }
    }

    /// Queue an order at its price, creating the level on first touch.
    pub fn add_order(&mut self, order: &OrderRef) {
        let (order_id, price, remaining) = {
            let order = order.lock();
            (order.order_id, order.price, order.remaining)
        };
        if remaining <= 0 {
            return;
        }
        self.levels
            .entry(OrderedPrice(price))
            .or_insert_with(|| PriceLevel::new(price))
            .add_order(order);
        debug!(order_id, price, remaining, side = %self.side, "order rested");
    }

    /// Remove an order, identified by its current price and id.
    ///
    /// Returns false when the level or the order cannot be found; the
    /// emptied level, if any, is pruned.
    pub fn remove_order(&mut self, order: &Order) -> bool {
        let key = OrderedPrice(order.price);
        let Some(level) = self.levels.get_mut(&key) else {
            warn!(order_id = order.order_id, price = order.price, side = %self.side,
                  "remove_order: no level at price");
            return false;
        };
        if !level.remove_order(order.order_id) {
            warn!(order_id = order.order_id, price = order.price, side = %self.side,
                  "remove_order: order not queued at level");
            return false;
        }
        if level.is_empty() {
            self.levels.remove(&key);
        }
        true
    }

    /// Price of the best non-empty level, if any.
    pub fn best_price(&self) -> Option<Price> {
        self.levels_best_first()
            .find(|level| !level.is_empty())
            .map(PriceLevel::price)
    }

    /// The best non-empty level, if any.
    pub fn best_level(&self) -> Option<&PriceLevel> {
        self.levels_best_first().find(|level| !level.is_empty())
    }

    /// Snapshots of the best `k` non-empty levels, best first.
    pub fn top_k_levels(&self, k: usize) -> Vec<BookLevel> {
        self.levels_best_first()
            .filter(|level| !level.is_empty())
            .take(k)
            .map(PriceLevel::view)
            .collect()
    }

    /// Liquidity available to `incoming` on this side, in match order.
    ///
    /// Sums level volumes until the incoming order's open quantity is
    /// covered, then returns early; limit orders stop at the first level
    /// beyond their price. Used by the fill-or-kill pre-check.
    pub fn available_quantity(&self, incoming: &Order) -> Quantity {
        let mut total: Quantity = 0;
        for level in self.levels_best_first() {
            if incoming.order_type == OrderType::Limit {
                let beyond_limit = match self.side {
                    Side::Sell => level.price() > incoming.price,
                    Side::Buy => level.price() < incoming.price,
                };
                if beyond_limit {
                    break;
                }
            }
            total += level.volume();
            if total >= incoming.remaining {
                return total;
            }
        }
        total
    }

    /// Match `incoming` against this side in price-time order.
    ///
    /// Fills advance on both the incoming and the resting order; each match
    /// appends a [`Trade`] priced at the resting order's price, with id and
    /// timestamp left for the engine to stamp. Fully filled resting orders
    /// are popped and emptied levels pruned; a partially filled resting
    /// order keeps its place at the head of the level.
    pub(crate) fn match_incoming(&mut self, incoming: &mut Order, trades: &mut Vec<Trade>) {
        debug_assert!(incoming.remaining > 0, "match with nothing open to fill");
        debug_assert!(
            incoming.order_type == OrderType::Market || incoming.price > 0.0,
            "limit order match with non-positive price"
        );

        while incoming.remaining > 0 {
            let Some(best_price) = self.best_price() else {
                break;
            };
            if incoming.order_type == OrderType::Limit {
                let crossed = match incoming.side {
                    Side::Buy => best_price <= incoming.price,
                    Side::Sell => best_price >= incoming.price,
                };
                if !crossed {
                    break;
                }
            }

            let key = OrderedPrice(best_price);
            let mut level_emptied = false;
            let (resting_id, trade_price, match_qty, resting_done) = {
                let level = self.levels.get_mut(&key).expect("best price has a level");
                let front = level
                    .front()
                    .map(Arc::clone)
                    .expect("best level has a head order");

                let (resting_id, trade_price, match_qty, resting_done) = {
                    let mut resting = front.lock();
                    let match_qty = incoming.remaining.min(resting.remaining);
                    let trade_price = resting.price;
                    resting.add_fill(match_qty);
                    (
                        resting.order_id,
                        trade_price,
                        match_qty,
                        resting.remaining == 0,
                    )
                };

                level.update_volume(match_qty);
                if resting_done {
                    let _ = level.pop_front();
                    level_emptied = level.is_empty();
                }
                (resting_id, trade_price, match_qty, resting_done)
            };
            if level_emptied {
                self.levels.remove(&key);
            }

            incoming.add_fill(match_qty);

            let (buy_order_id, sell_order_id) = match incoming.side {
                Side::Buy => (incoming.order_id, resting_id),
                Side::Sell => (resting_id, incoming.order_id),
            };
            trades.push(Trade {
                trade_id: INVALID_TRADE_ID,
                symbol: incoming.symbol.clone(),
                buy_order_id,
                sell_order_id,
                price: trade_price,
                quantity: match_qty,
                // provisional; the engine stamps the batch after matching
                timestamp: incoming.timestamp,
            });
            debug!(
                buy_order_id,
                sell_order_id,
                price = trade_price,
                quantity = match_qty,
                resting_done,
                "match"
            );
        }
    }

    #[cfg(test)]
    pub(crate) fn levels(&self) -> impl Iterator<Item = &PriceLevel> {
        self.levels.values()
    }
}

/// Two opposing sides plus the book-level submit / cancel / modify logic,
/// including time-in-force semantics.
#[derive(Debug)]
pub struct OrderBook {
    bids: OrderBookSide,
    asks: OrderBookSide,
}

impl OrderBook {
    /// Create an empty book.
    pub fn new() -> Self {
        Self {
            bids: OrderBookSide::new(Side::Buy),
            asks: OrderBookSide::new(Side::Sell),
        }
    }

    /// The bid side.
    pub fn bids(&self) -> &OrderBookSide {
        &self.bids
    }

    /// The ask side.
    pub fn asks(&self) -> &OrderBookSide {
        &self.asks
    }

    fn side_mut(&mut self, side: Side) -> &mut OrderBookSide {
        match side {
            Side::Buy => &mut self.bids,
            Side::Sell => &mut self.asks,
        }
    }

    fn opposite_mut(&mut self, side: Side) -> &mut OrderBookSide {
        self.side_mut(side.opposite())
    }

    /// The side an order of `side` matches against.
    pub fn opposite(&self, side: Side) -> &OrderBookSide {
        match side {
            Side::Buy => &self.asks,
            Side::Sell => &self.bids,
        }
    }

    /// Submit an order: match it against the opposite side and rest any
    /// surplus according to its time in force.
    ///
    /// Fill-or-kill orders are pre-checked against available liquidity and
    /// rejected without touching the book when they cannot fill completely.
    /// Good-til-canceled surplus rests on the own side; immediate-or-cancel
    /// surplus is discarded.
    pub fn submit_order(&mut self, order: &OrderRef) -> Vec<Trade> {
        let mut trades = Vec::new();
        {
            let mut incoming = order.lock();
            debug_assert!(incoming.remaining > 0, "submit with nothing open to fill");
            debug_assert!(incoming.price >= 0.0, "submit with negative price");

            if incoming.tif == TimeInForce::FillOrKill {
                let available = self.opposite(incoming.side).available_quantity(&incoming);
                if available < incoming.remaining {
                    debug!(
                        order_id = incoming.order_id,
                        available,
                        remaining = incoming.remaining,
                        "fill-or-kill order killed"
                    );
                    return trades;
                }
            }

            let side = incoming.side;
            self.opposite_mut(side).match_incoming(&mut incoming, &mut trades);
        }

        let (side, tif, remaining) = {
            let order = order.lock();
            (order.side, order.tif, order.remaining)
        };
        if remaining > 0 && tif == TimeInForce::GoodTilCanceled {
            self.side_mut(side).add_order(order);
        }
        trades
    }

    /// Remove a resting order from its side. Returns true on removal.
    pub fn cancel_order(&mut self, order: &Order) -> bool {
        self.side_mut(order.side).remove_order(order)
    }

    /// Amend a resting order in place, without rematching.
    ///
    /// The order is removed from its level, the new price and/or quantity
    /// applied, and re-queued at the tail of its (possibly new) level: time
    /// priority is lost. An amend below the filled quantity is rejected.
    pub fn modify_order(&mut self, order: &OrderRef, req: &ModifyOrderRequest) -> bool {
        let snapshot = order.lock().clone();
        if let Some(new_qty) = req.new_quantity {
            if new_qty < snapshot.filled {
                warn!(
                    order_id = snapshot.order_id,
                    new_qty,
                    filled = snapshot.filled,
                    "modify below filled quantity rejected"
                );
                return false;
            }
        }

        if !self.side_mut(snapshot.side).remove_order(&snapshot) {
            warn!(order_id = snapshot.order_id, "modify could not locate resting order");
            return false;
        }

        let remaining = {
            let mut live = order.lock();
            if let Some(price) = req.new_price {
                live.price = price;
            }
            if let Some(qty) = req.new_quantity {
                live.qty = qty;
            }
            live.remaining = live.qty - live.filled;
            live.remaining
        };

        if remaining > 0 {
            self.side_mut(snapshot.side).add_order(order);
        }
        true
    }

    /// Snapshot of the best bid level, if any.
    pub fn best_bid(&self) -> Option<BookLevel> {
        self.bids.best_level().map(PriceLevel::view)
    }

    /// Snapshot of the best ask level, if any.
    pub fn best_ask(&self) -> Option<BookLevel> {
        self.asks.best_level().map(PriceLevel::view)
    }

    /// Snapshots of the best `levels` levels on each side, best first.
    pub fn depth(&self, levels: usize) -> (Vec<BookLevel>, Vec<BookLevel>) {
        (self.bids.top_k_levels(levels), self.asks.top_k_levels(levels))
    }
}

impl Default for OrderBook {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::order::NewOrderRequest;
    use crate::core::types::Symbol;
    use chrono::Utc;

    fn order_ref(
        order_id: OrderId,
        side: Side,
        order_type: OrderType,
        tif: TimeInForce,
        price: Price,
        quantity: Quantity,
    ) -> OrderRef {
        let req = NewOrderRequest {
            symbol: Symbol::from("AAPL"),
            side,
            order_type,
            tif,
            price,
            quantity,
        };
        Arc::new(Mutex::new(Order::from_request(order_id, &req, Utc::now())))
    }

    fn gtc_limit(order_id: OrderId, side: Side, price: Price, quantity: Quantity) -> OrderRef {
        order_ref(
            order_id,
            side,
            OrderType::Limit,
            TimeInForce::GoodTilCanceled,
            price,
            quantity,
        )
    }

    #[test]
    fn test_price_level_add_and_volume() {
        let mut level = PriceLevel::new(100.0);
        assert!(level.is_empty());
        assert_eq!(level.volume(), 0);

        level.add_order(&gtc_limit(1, Side::Sell, 100.0, 10));
        level.add_order(&gtc_limit(2, Side::Sell, 100.0, 5));
        assert_eq!(level.len(), 2);
        assert_eq!(level.volume(), 15);
        assert_eq!(level.front().unwrap().lock().order_id, 1);
    }

    #[test]
    fn test_price_level_rejects_spent_order() {
        let mut level = PriceLevel::new(100.0);
        let spent = gtc_limit(1, Side::Sell, 100.0, 10);
        spent.lock().add_fill(10);
        level.add_order(&spent);
        assert!(level.is_empty());
        assert_eq!(level.volume(), 0);
    }

    #[test]
    fn test_price_level_pop_and_remove() {
        let mut level = PriceLevel::new(100.0);
        level.add_order(&gtc_limit(1, Side::Sell, 100.0, 10));
        level.add_order(&gtc_limit(2, Side::Sell, 100.0, 5));

        let popped = level.pop_front().unwrap();
        assert_eq!(popped.lock().order_id, 1);
        assert_eq!(level.volume(), 5);

        assert!(!level.remove_order(99));
        assert!(level.remove_order(2));
        assert!(level.is_empty());
        assert_eq!(level.volume(), 0);
    }

    #[test]
    fn test_price_level_update_volume() {
        let mut level = PriceLevel::new(100.0);
        level.add_order(&gtc_limit(1, Side::Sell, 100.0, 10));
        level.update_volume(4);
        assert_eq!(level.volume(), 6);
    }

    #[test]
    fn test_ordered_price_sorts_in_btreemap() {
        let mut map = BTreeMap::new();
        for price in [101.5, 99.0, 100.25] {
            map.insert(OrderedPrice(price), price);
        }
        let sorted: Vec<Price> = map.values().copied().collect();
        assert_eq!(sorted, vec![99.0, 100.25, 101.5]);
    }

    #[test]
    fn test_side_best_prices() {
        let mut bids = OrderBookSide::new(Side::Buy);
        bids.add_order(&gtc_limit(1, Side::Buy, 99.0, 5));
        bids.add_order(&gtc_limit(2, Side::Buy, 100.0, 3));
        assert_eq!(bids.best_price(), Some(100.0));

        let mut asks = OrderBookSide::new(Side::Sell);
        asks.add_order(&gtc_limit(3, Side::Sell, 101.0, 4));
        asks.add_order(&gtc_limit(4, Side::Sell, 102.0, 6));
        assert_eq!(asks.best_price(), Some(101.0));
    }

    #[test]
    fn test_side_remove_prunes_empty_level() {
        let mut asks = OrderBookSide::new(Side::Sell);
        let order = gtc_limit(1, Side::Sell, 101.0, 4);
        asks.add_order(&order);

        let snapshot = order.lock().clone();
        assert!(asks.remove_order(&snapshot));
        assert_eq!(asks.best_price(), None);
        assert_eq!(asks.levels().count(), 0);

        // second removal finds nothing
        assert!(!asks.remove_order(&snapshot));
    }

    #[test]
    fn test_side_top_k_levels() {
        let mut bids = OrderBookSide::new(Side::Buy);
        bids.add_order(&gtc_limit(1, Side::Buy, 99.0, 5));
        bids.add_order(&gtc_limit(2, Side::Buy, 100.0, 3));
        bids.add_order(&gtc_limit(3, Side::Buy, 98.5, 7));

        let top = bids.top_k_levels(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].price, 100.0);
        assert_eq!(top[0].volume, 3);
        assert_eq!(top[1].price, 99.0);
    }

    #[test]
    fn test_available_quantity_limit_probe_stops_at_limit() {
        let mut asks = OrderBookSide::new(Side::Sell);
        asks.add_order(&gtc_limit(1, Side::Sell, 100.0, 4));
        asks.add_order(&gtc_limit(2, Side::Sell, 101.0, 4));
        asks.add_order(&gtc_limit(3, Side::Sell, 102.0, 4));

        let probe = gtc_limit(9, Side::Buy, 101.0, 20);
        let available = asks.available_quantity(&probe.lock());
        assert_eq!(available, 8);
    }

    #[test]
    fn test_available_quantity_returns_early_when_covered() {
        let mut asks = OrderBookSide::new(Side::Sell);
        asks.add_order(&gtc_limit(1, Side::Sell, 100.0, 10));
        asks.add_order(&gtc_limit(2, Side::Sell, 101.0, 10));

        let probe = gtc_limit(9, Side::Buy, 101.0, 6);
        // early return with the first level's volume already covering the order
        assert_eq!(asks.available_quantity(&probe.lock()), 10);
    }

    #[test]
    fn test_available_quantity_market_probes_all_levels() {
        let mut bids = OrderBookSide::new(Side::Buy);
        bids.add_order(&gtc_limit(1, Side::Buy, 99.0, 5));
        bids.add_order(&gtc_limit(2, Side::Buy, 90.0, 5));

        let probe = order_ref(
            9,
            Side::Sell,
            OrderType::Market,
            TimeInForce::ImmediateOrCancel,
            0.0,
            20,
        );
        assert_eq!(bids.available_quantity(&probe.lock()), 10);
    }

    #[test]
    fn test_match_respects_fifo_within_level() {
        let mut asks = OrderBookSide::new(Side::Sell);
        let first = gtc_limit(1, Side::Sell, 100.0, 10);
        let second = gtc_limit(2, Side::Sell, 100.0, 10);
        asks.add_order(&first);
        asks.add_order(&second);

        let incoming = gtc_limit(3, Side::Buy, 101.0, 15);
        let mut trades = Vec::new();
        asks.match_incoming(&mut incoming.lock(), &mut trades);

        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].sell_order_id, 1);
        assert_eq!(trades[0].quantity, 10);
        assert_eq!(trades[1].sell_order_id, 2);
        assert_eq!(trades[1].quantity, 5);

        // the partially filled order keeps the head of its level
        assert_eq!(first.lock().remaining, 0);
        assert_eq!(second.lock().remaining, 5);
        let best = asks.best_level().unwrap();
        assert_eq!(best.volume(), 5);
        assert_eq!(best.front().unwrap().lock().order_id, 2);
    }

    #[test]
    fn test_match_trade_price_is_resting_price() {
        let mut asks = OrderBookSide::new(Side::Sell);
        asks.add_order(&gtc_limit(1, Side::Sell, 100.0, 10));

        let incoming = gtc_limit(2, Side::Buy, 105.0, 10);
        let mut trades = Vec::new();
        asks.match_incoming(&mut incoming.lock(), &mut trades);

        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, 100.0);
        assert_eq!(trades[0].buy_order_id, 2);
        assert_eq!(trades[0].sell_order_id, 1);
    }

    #[test]
    fn test_match_stops_at_limit_price() {
        let mut asks = OrderBookSide::new(Side::Sell);
        asks.add_order(&gtc_limit(1, Side::Sell, 100.0, 4));
        asks.add_order(&gtc_limit(2, Side::Sell, 102.0, 4));

        let incoming = gtc_limit(3, Side::Buy, 101.0, 10);
        let mut trades = Vec::new();
        asks.match_incoming(&mut incoming.lock(), &mut trades);

        assert_eq!(trades.len(), 1);
        assert_eq!(incoming.lock().remaining, 6);
        assert_eq!(asks.best_price(), Some(102.0));
    }

    #[test]
    fn test_match_sell_walks_bids_downward() {
        let mut bids = OrderBookSide::new(Side::Buy);
        bids.add_order(&gtc_limit(1, Side::Buy, 100.0, 5));
        bids.add_order(&gtc_limit(2, Side::Buy, 99.0, 5));

        let incoming = gtc_limit(3, Side::Sell, 99.0, 8);
        let mut trades = Vec::new();
        bids.match_incoming(&mut incoming.lock(), &mut trades);

        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].price, 100.0);
        assert_eq!(trades[0].quantity, 5);
        assert_eq!(trades[1].price, 99.0);
        assert_eq!(trades[1].quantity, 3);
        assert_eq!(bids.best_level().unwrap().volume(), 2);
    }

    #[test]
    fn test_book_submit_rests_gtc_surplus() {
        let mut book = OrderBook::new();
        let order = gtc_limit(1, Side::Buy, 100.0, 10);
        let trades = book.submit_order(&order);
        assert!(trades.is_empty());
        let bid = book.best_bid().unwrap();
        assert_eq!(bid.price, 100.0);
        assert_eq!(bid.volume, 10);
    }

    #[test]
    fn test_book_submit_ioc_discards_surplus() {
        let mut book = OrderBook::new();
        book.submit_order(&gtc_limit(1, Side::Sell, 101.0, 4));

        let ioc = order_ref(
            2,
            Side::Buy,
            OrderType::Limit,
            TimeInForce::ImmediateOrCancel,
            101.0,
            10,
        );
        let trades = book.submit_order(&ioc);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].quantity, 4);
        assert_eq!(ioc.lock().remaining, 6);
        assert!(book.best_bid().is_none());
        assert!(book.best_ask().is_none());
    }

    #[test]
    fn test_book_submit_fok_insufficient_leaves_book_untouched() {
        let mut book = OrderBook::new();
        book.submit_order(&gtc_limit(1, Side::Sell, 101.0, 4));

        let fok = order_ref(
            2,
            Side::Buy,
            OrderType::Limit,
            TimeInForce::FillOrKill,
            101.0,
            10,
        );
        let trades = book.submit_order(&fok);
        assert!(trades.is_empty());
        assert_eq!(fok.lock().remaining, 10);
        assert_eq!(book.best_ask().unwrap().volume, 4);
    }

    #[test]
    fn test_book_submit_fok_sufficient_fills_completely() {
        let mut book = OrderBook::new();
        book.submit_order(&gtc_limit(1, Side::Sell, 100.0, 6));
        book.submit_order(&gtc_limit(2, Side::Sell, 101.0, 6));

        let fok = order_ref(
            3,
            Side::Buy,
            OrderType::Limit,
            TimeInForce::FillOrKill,
            101.0,
            10,
        );
        let trades = book.submit_order(&fok);
        assert_eq!(trades.len(), 2);
        assert_eq!(fok.lock().remaining, 0);
        assert_eq!(book.best_ask().unwrap().volume, 2);
    }

    #[test]
    fn test_book_market_order_never_rests() {
        let mut book = OrderBook::new();
        book.submit_order(&gtc_limit(1, Side::Sell, 101.0, 4));

        let market = order_ref(
            2,
            Side::Buy,
            OrderType::Market,
            TimeInForce::ImmediateOrCancel,
            0.0,
            10,
        );
        let trades = book.submit_order(&market);
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, 101.0);
        assert_eq!(market.lock().remaining, 6);
        assert!(book.best_bid().is_none());
    }

    #[test]
    fn test_book_cancel_then_miss() {
        let mut book = OrderBook::new();
        let order = gtc_limit(1, Side::Buy, 100.0, 10);
        book.submit_order(&order);

        let snapshot = order.lock().clone();
        assert!(book.cancel_order(&snapshot));
        assert!(book.best_bid().is_none());
        assert!(!book.cancel_order(&snapshot));
    }

    #[test]
    fn test_book_modify_rejects_qty_below_filled() {
        let mut book = OrderBook::new();
        let order = gtc_limit(1, Side::Sell, 100.0, 10);
        book.submit_order(&order);
        book.submit_order(&gtc_limit(2, Side::Buy, 100.0, 6));
        assert_eq!(order.lock().filled, 6);

        assert!(!book.modify_order(&order, &ModifyOrderRequest::quantity(5)));
        assert_eq!(book.best_ask().unwrap().volume, 4);
    }

    #[test]
    fn test_book_modify_requeues_at_tail() {
        let mut book = OrderBook::new();
        let first = gtc_limit(1, Side::Buy, 100.0, 10);
        let second = gtc_limit(2, Side::Buy, 100.0, 10);
        book.submit_order(&first);
        book.submit_order(&second);

        assert!(book.modify_order(&first, &ModifyOrderRequest::quantity(15)));

        let bids = book.bids();
        let best = bids.best_level().unwrap();
        assert_eq!(best.volume(), 25);
        // the modified order lost time priority
        assert_eq!(best.front().unwrap().lock().order_id, 2);
    }

    #[test]
    fn test_book_modify_moves_price_level() {
        let mut book = OrderBook::new();
        let order = gtc_limit(1, Side::Buy, 100.0, 10);
        book.submit_order(&order);

        assert!(book.modify_order(&order, &ModifyOrderRequest::price(99.5)));
        let bid = book.best_bid().unwrap();
        assert_eq!(bid.price, 99.5);
        assert_eq!(bid.volume, 10);
        let live = order.lock();
        assert_eq!(live.price, 99.5);
        assert_eq!(live.remaining, 10);
    }

    #[test]
    fn test_level_volume_matches_order_sum_after_matching() {
        let mut book = OrderBook::new();
        book.submit_order(&gtc_limit(1, Side::Sell, 100.0, 10));
        book.submit_order(&gtc_limit(2, Side::Sell, 100.0, 7));
        book.submit_order(&gtc_limit(3, Side::Buy, 100.0, 12));

        for level in book.asks().levels() {
            let sum: Quantity = level.orders().map(|o| o.lock().remaining).sum();
            assert_eq!(level.volume(), sum);
            assert!(!level.is_empty());
        }
    }
}
