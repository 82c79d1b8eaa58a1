use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use marketplace_accounts::{Buyer, Seller};
use marketplace_catalog::Item;
use marketplace_core::{BuyerId, Email, ItemId, Money, PurchaseId, SellerId};
use marketplace_purchasing::Purchase;

use super::query::{
    BuyerFilter, ItemFilter, ItemSales, ItemSort, Page, Pagination, PurchaseFilter, SellerFilter,
    name_matches,
};
use super::r#trait::{EntityStore, StoreError, UnitOfWork};

#[derive(Debug, Clone, Default)]
struct Tables {
    buyers: BTreeMap<BuyerId, Buyer>,
    sellers: BTreeMap<SellerId, Seller>,
    items: BTreeMap<ItemId, Item>,
    purchases: BTreeMap<PurchaseId, Purchase>,
}

impl Tables {
    fn buyer_matches(&self, buyer: &Buyer, filter: &BuyerFilter) -> bool {
        name_matches(&buyer.name, filter.name_contains.as_deref())
            && (!filter.with_purchases || self.purchases.values().any(|p| p.buyer_id == buyer.id))
    }

    fn seller_matches(&self, seller: &Seller, filter: &SellerFilter) -> bool {
        name_matches(&seller.name, filter.name_contains.as_deref())
            && (!filter.with_items || self.items.values().any(|i| i.seller_id == seller.id))
            && (!filter.with_sales
                || self
                    .purchases
                    .values()
                    .any(|p| self.seller_of(p.item_id) == Some(seller.id)))
    }

    fn item_matches(item: &Item, filter: &ItemFilter) -> bool {
        filter.seller_id.is_none_or(|s| item.seller_id == s)
            && name_matches(&item.name, filter.name_contains.as_deref())
            && filter.min_price.is_none_or(|min| item.price >= min)
            && filter.max_price.is_none_or(|max| item.price <= max)
            && (!filter.available_only || item.in_stock())
            && filter.max_quantity.is_none_or(|max| item.quantity <= max)
    }

    fn purchase_matches(&self, purchase: &Purchase, filter: &PurchaseFilter) -> bool {
        filter.buyer_id.is_none_or(|b| purchase.buyer_id == b)
            && filter.item_id.is_none_or(|i| purchase.item_id == i)
            && filter
                .seller_id
                .is_none_or(|s| self.seller_of(purchase.item_id) == Some(s))
            && filter.purchased_from.is_none_or(|from| purchase.purchased_at >= from)
            && filter.purchased_to.is_none_or(|to| purchase.purchased_at <= to)
    }

    fn seller_of(&self, item_id: ItemId) -> Option<SellerId> {
        self.items.get(&item_id).map(|i| i.seller_id)
    }

    fn filtered_buyers(&self, filter: &BuyerFilter) -> Vec<Buyer> {
        let mut out: Vec<Buyer> = self
            .buyers
            .values()
            .filter(|b| self.buyer_matches(b, filter))
            .cloned()
            .collect();
        out.sort_by(|a, b| (a.registered_at, a.id).cmp(&(b.registered_at, b.id)));
        out
    }

    fn filtered_sellers(&self, filter: &SellerFilter) -> Vec<Seller> {
        let mut out: Vec<Seller> = self
            .sellers
            .values()
            .filter(|s| self.seller_matches(s, filter))
            .cloned()
            .collect();
        out.sort_by(|a, b| (a.registered_at, a.id).cmp(&(b.registered_at, b.id)));
        out
    }

    fn filtered_items(&self, filter: &ItemFilter) -> Vec<Item> {
        let mut out: Vec<Item> = self
            .items
            .values()
            .filter(|i| Self::item_matches(i, filter))
            .cloned()
            .collect();
        match filter.sort {
            ItemSort::Newest => {
                out.sort_by(|a, b| (b.listed_at, b.id).cmp(&(a.listed_at, a.id)));
            }
            ItemSort::PriceAsc => out.sort_by(|a, b| (a.price, a.id).cmp(&(b.price, b.id))),
            ItemSort::PriceDesc => out.sort_by(|a, b| (b.price, b.id).cmp(&(a.price, a.id))),
        }
        out
    }

    fn filtered_purchases(&self, filter: &PurchaseFilter) -> Vec<Purchase> {
        let mut out: Vec<Purchase> = self
            .purchases
            .values()
            .filter(|p| self.purchase_matches(p, filter))
            .cloned()
            .collect();
        out.sort_by(|a, b| (b.purchased_at, b.id).cmp(&(a.purchased_at, a.id)));
        out
    }
}

fn paginate<T>(all: Vec<T>, pagination: Pagination) -> Page<T> {
    let total = all.len() as u64;
    let items = all
        .into_iter()
        .skip(pagination.offset as usize)
        .take(pagination.limit as usize)
        .collect();
    Page::new(items, total, pagination)
}

/// In-memory entity store.
///
/// Intended for tests/dev. Units of work are serialized: `begin` waits until
/// the previous unit of work has committed or been dropped, which gives the
/// same isolation as row locks (and more). Relational constraints are checked
/// on every write.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntityStore {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl EntityStore for InMemoryEntityStore {
    type UnitOfWork = InMemoryUnitOfWork;

    /// Waits for the tables, then copies all of them into the unit of work,
    /// so every unit of work costs time linear in the number of stored rows.
    async fn begin(&self) -> Result<Self::UnitOfWork, StoreError> {
        let guard = self.tables.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(InMemoryUnitOfWork { guard, staged })
    }
}

/// Unit of work over a private copy of the tables, published on commit.
#[derive(Debug)]
pub struct InMemoryUnitOfWork {
    guard: OwnedMutexGuard<Tables>,
    staged: Tables,
}

#[async_trait::async_trait]
impl UnitOfWork for InMemoryUnitOfWork {
    async fn find_buyer(&mut self, id: BuyerId) -> Result<Option<Buyer>, StoreError> {
        Ok(self.staged.buyers.get(&id).cloned())
    }

    async fn find_buyer_by_email(&mut self, email: &Email) -> Result<Option<Buyer>, StoreError> {
        Ok(self.staged.buyers.values().find(|b| &b.email == email).cloned())
    }

    async fn buyer_exists(&mut self, id: BuyerId) -> Result<bool, StoreError> {
        Ok(self.staged.buyers.contains_key(&id))
    }

    async fn save_buyer(&mut self, buyer: &Buyer) -> Result<(), StoreError> {
        let taken = self
            .staged
            .buyers
            .values()
            .any(|b| b.email == buyer.email && b.id != buyer.id);
        if taken {
            return Err(StoreError::UniqueViolation(format!(
                "buyers.email {} already exists",
                buyer.email
            )));
        }
        self.staged.buyers.insert(buyer.id, buyer.clone());
        Ok(())
    }

    async fn delete_buyer(&mut self, id: BuyerId) -> Result<bool, StoreError> {
        if self.staged.purchases.values().any(|p| p.buyer_id == id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "buyer {id} is referenced by purchases"
            )));
        }
        Ok(self.staged.buyers.remove(&id).is_some())
    }

    async fn list_buyers(
        &mut self,
        filter: &BuyerFilter,
        pagination: Pagination,
    ) -> Result<Page<Buyer>, StoreError> {
        Ok(paginate(self.staged.filtered_buyers(filter), pagination))
    }

    async fn count_buyers(&mut self, filter: &BuyerFilter) -> Result<u64, StoreError> {
        Ok(self.staged.filtered_buyers(filter).len() as u64)
    }

    async fn find_seller(&mut self, id: SellerId) -> Result<Option<Seller>, StoreError> {
        Ok(self.staged.sellers.get(&id).cloned())
    }

    async fn find_seller_by_email(
        &mut self,
        email: &Email,
    ) -> Result<Option<Seller>, StoreError> {
        Ok(self.staged.sellers.values().find(|s| &s.email == email).cloned())
    }

    async fn seller_exists(&mut self, id: SellerId) -> Result<bool, StoreError> {
        Ok(self.staged.sellers.contains_key(&id))
    }

    async fn save_seller(&mut self, seller: &Seller) -> Result<(), StoreError> {
        let taken = self
            .staged
            .sellers
            .values()
            .any(|s| s.email == seller.email && s.id != seller.id);
        if taken {
            return Err(StoreError::UniqueViolation(format!(
                "sellers.email {} already exists",
                seller.email
            )));
        }
        self.staged.sellers.insert(seller.id, seller.clone());
        Ok(())
    }

    async fn delete_seller(&mut self, id: SellerId) -> Result<bool, StoreError> {
        if self.staged.items.values().any(|i| i.seller_id == id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "seller {id} is referenced by items"
            )));
        }
        Ok(self.staged.sellers.remove(&id).is_some())
    }

    async fn list_sellers(
        &mut self,
        filter: &SellerFilter,
        pagination: Pagination,
    ) -> Result<Page<Seller>, StoreError> {
        Ok(paginate(self.staged.filtered_sellers(filter), pagination))
    }

    async fn count_sellers(&mut self, filter: &SellerFilter) -> Result<u64, StoreError> {
        Ok(self.staged.filtered_sellers(filter).len() as u64)
    }

    async fn find_item(&mut self, id: ItemId) -> Result<Option<Item>, StoreError> {
        Ok(self.staged.items.get(&id).cloned())
    }

    async fn lock_item(&mut self, id: ItemId) -> Result<Option<Item>, StoreError> {
        // The whole store is already held exclusively.
        self.find_item(id).await
    }

    async fn item_exists(&mut self, id: ItemId) -> Result<bool, StoreError> {
        Ok(self.staged.items.contains_key(&id))
    }

    async fn save_item(&mut self, item: &Item) -> Result<(), StoreError> {
        if !self.staged.sellers.contains_key(&item.seller_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "item {} references missing seller {}",
                item.id, item.seller_id
            )));
        }
        if item.quantity < 0 {
            return Err(StoreError::CheckViolation(format!(
                "item {} quantity must not be negative",
                item.id
            )));
        }
        if item.price.is_zero() || item.price.ensure_storable().is_err() {
            return Err(StoreError::CheckViolation(format!(
                "item {} price {} out of range",
                item.id, item.price
            )));
        }
        self.staged.items.insert(item.id, item.clone());
        Ok(())
    }

    async fn delete_item(&mut self, id: ItemId) -> Result<bool, StoreError> {
        if self.staged.purchases.values().any(|p| p.item_id == id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "item {id} is referenced by purchases"
            )));
        }
        Ok(self.staged.items.remove(&id).is_some())
    }

    async fn list_items(
        &mut self,
        filter: &ItemFilter,
        pagination: Pagination,
    ) -> Result<Page<Item>, StoreError> {
        Ok(paginate(self.staged.filtered_items(filter), pagination))
    }

    async fn count_items(&mut self, filter: &ItemFilter) -> Result<u64, StoreError> {
        Ok(self.staged.filtered_items(filter).len() as u64)
    }

    async fn find_purchase(&mut self, id: PurchaseId) -> Result<Option<Purchase>, StoreError> {
        Ok(self.staged.purchases.get(&id).cloned())
    }

    async fn lock_purchase(&mut self, id: PurchaseId) -> Result<Option<Purchase>, StoreError> {
        self.find_purchase(id).await
    }

    async fn save_purchase(&mut self, purchase: &Purchase) -> Result<(), StoreError> {
        if !self.staged.buyers.contains_key(&purchase.buyer_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "purchase {} references missing buyer {}",
                purchase.id, purchase.buyer_id
            )));
        }
        if !self.staged.items.contains_key(&purchase.item_id) {
            return Err(StoreError::ForeignKeyViolation(format!(
                "purchase {} references missing item {}",
                purchase.id, purchase.item_id
            )));
        }
        if purchase.quantity <= 0 || purchase.total_price.ensure_storable().is_err() {
            return Err(StoreError::CheckViolation(format!(
                "purchase {} quantity or total out of range",
                purchase.id
            )));
        }
        self.staged.purchases.insert(purchase.id, purchase.clone());
        Ok(())
    }

    async fn delete_purchase(&mut self, id: PurchaseId) -> Result<bool, StoreError> {
        Ok(self.staged.purchases.remove(&id).is_some())
    }

    async fn list_purchases(
        &mut self,
        filter: &PurchaseFilter,
        pagination: Pagination,
    ) -> Result<Page<Purchase>, StoreError> {
        Ok(paginate(self.staged.filtered_purchases(filter), pagination))
    }

    async fn count_purchases(&mut self, filter: &PurchaseFilter) -> Result<u64, StoreError> {
        Ok(self.staged.filtered_purchases(filter).len() as u64)
    }

    async fn sum_total_price(&mut self, filter: &PurchaseFilter) -> Result<Money, StoreError> {
        self.staged
            .filtered_purchases(filter)
            .iter()
            .try_fold(Money::ZERO, |sum, p| sum.checked_add(p.total_price))
            .map_err(|e| StoreError::Backend(e.to_string()))
    }

    async fn most_purchased_items(&mut self, limit: u32) -> Result<Vec<ItemSales>, StoreError> {
        let mut totals: HashMap<ItemId, i64> = HashMap::new();
        for p in self.staged.purchases.values() {
            let total = totals.entry(p.item_id).or_default();
            *total = total.checked_add(p.quantity).ok_or_else(|| {
                StoreError::Backend(format!("units sold of item {} overflow", p.item_id))
            })?;
        }

        let mut ranked = Vec::with_capacity(totals.len());
        for (item_id, total_quantity) in totals {
            let item = self.staged.items.get(&item_id).ok_or_else(|| {
                StoreError::Backend(format!("purchase references missing item {item_id}"))
            })?;
            ranked.push(ItemSales {
                item_id,
                item_name: item.name.clone(),
                total_quantity,
            });
        }
        ranked.sort_by(|a, b| {
            b.total_quantity
                .cmp(&a.total_quantity)
                .then_with(|| a.item_name.cmp(&b.item_name))
                .then_with(|| a.item_id.cmp(&b.item_id))
        });
        ranked.truncate(limit as usize);
        Ok(ranked)
    }

    async fn commit(self) -> Result<(), StoreError> {
        let Self { mut guard, staged } = self;
        *guard = staged;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        Ok(())
    }
}
