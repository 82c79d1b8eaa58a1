//! Postgres-backed entity store.
//!
//! Each [`PostgresUnitOfWork`] wraps one database transaction. Row locks are
//! taken with `SELECT ... FOR UPDATE`; relational constraints live in the
//! schema (`migrations/`).
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | StoreError |
//! |------------|----------------------|------------|
//! | Database (unique violation) | `23505` | `UniqueViolation` |
//! | Database (foreign key violation) | `23503` | `ForeignKeyViolation` |
//! | Database (other) | Any other | `Backend` |
//! | ColumnDecode / Decode | N/A | `Decode` |
//! | Other | N/A | `Backend` |

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder, Transaction};
use tracing::{Span, instrument};
use uuid::Uuid;

use marketplace_accounts::{Buyer, Seller};
use marketplace_catalog::Item;
use marketplace_core::{BuyerId, Email, ItemId, Money, PurchaseId, SellerId};
use marketplace_purchasing::Purchase;

use super::query::{
    BuyerFilter, ItemFilter, ItemSales, ItemSort, Page, Pagination, PurchaseFilter, SellerFilter,
    escape_like,
};
use super::r#trait::{EntityStore, StoreError, UnitOfWork};

const ACCOUNT_COLUMNS: &str = "a.id, a.name, a.email, a.registered_at";
const ITEM_COLUMNS: &str =
    "i.id, i.seller_id, i.name, i.description, i.price, i.quantity, i.listed_at";
const PURCHASE_COLUMNS: &str =
    "p.id, p.buyer_id, p.item_id, p.quantity, p.unit_price, p.total_price, p.purchased_at";

/// Postgres-backed entity store.
///
/// `PostgresEntityStore` is `Send + Sync` and cheap to clone; the SQLx pool
/// handles connection management.
#[derive(Debug, Clone)]
pub struct PostgresEntityStore {
    pool: Arc<PgPool>,
}

impl PostgresEntityStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a connection pool against `database_url`.
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Apply the embedded schema migrations.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&*self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {e}")))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl EntityStore for PostgresEntityStore {
    type UnitOfWork = PostgresUnitOfWork;

    async fn begin(&self) -> Result<Self::UnitOfWork, StoreError> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        Ok(PostgresUnitOfWork { tx })
    }
}

/// One Postgres transaction. Dropping it without `commit` rolls back.
pub struct PostgresUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl PostgresUnitOfWork {
    async fn fetch_account(
        &mut self,
        operation: &str,
        sql: &str,
        id: Uuid,
    ) -> Result<Option<AccountRow>, StoreError> {
        sqlx::query_as::<_, AccountRow>(sql)
            .bind(id)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error(operation, e))
    }

    async fn fetch_account_by_email(
        &mut self,
        operation: &str,
        sql: &str,
        email: &Email,
    ) -> Result<Option<AccountRow>, StoreError> {
        sqlx::query_as::<_, AccountRow>(sql)
            .bind(email.as_str())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error(operation, e))
    }

    async fn exists(&mut self, operation: &str, sql: &str, id: Uuid) -> Result<bool, StoreError> {
        sqlx::query_scalar::<_, bool>(sql)
            .bind(id)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error(operation, e))
    }

    async fn delete(&mut self, operation: &str, sql: &str, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query(sql)
            .bind(id)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn save_account(
        &mut self,
        operation: &str,
        table: &str,
        id: Uuid,
        name: &str,
        email: &Email,
        registered_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let sql = format!(
            r#"
            INSERT INTO {table} (id, name, email, registered_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email
            "#
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(name)
            .bind(email.as_str())
            .bind(registered_at)
            .execute(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        Ok(())
    }

    async fn fetch_count(
        &mut self,
        operation: &str,
        mut qb: QueryBuilder<'static, Postgres>,
    ) -> Result<u64, StoreError> {
        let total: i64 = qb
            .build_query_scalar()
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        Ok(total.max(0) as u64)
    }

    async fn fetch_rows<R>(
        &mut self,
        operation: &str,
        mut qb: QueryBuilder<'static, Postgres>,
        order_by: &str,
        pagination: Pagination,
    ) -> Result<Vec<R>, StoreError>
    where
        R: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
    {
        qb.push(" ORDER BY ")
            .push(order_by)
            .push(" LIMIT ")
            .push_bind(i64::from(pagination.limit))
            .push(" OFFSET ")
            .push_bind(i64::from(pagination.offset));
        qb.build_query_as::<R>()
            .fetch_all(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error(operation, e))
    }

    async fn page<R, T>(
        &mut self,
        operation: &str,
        build: impl Fn(&str) -> QueryBuilder<'static, Postgres> + Send,
        columns: &str,
        order_by: &str,
        pagination: Pagination,
    ) -> Result<Page<T>, StoreError>
    where
        R: for<'r> FromRow<'r, sqlx::postgres::PgRow> + Send + Unpin,
        T: TryFrom<R, Error = StoreError>,
    {
        let total = self.fetch_count(operation, build("COUNT(*)")).await?;
        let rows: Vec<R> = self
            .fetch_rows(operation, build(columns), order_by, pagination)
            .await?;
        let items = rows
            .into_iter()
            .map(T::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, total, pagination))
    }
}

fn buyers_query(select: &str, filter: &BuyerFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {select} FROM buyers a WHERE TRUE"));
    push_name_filter(&mut qb, "a.name", filter.name_contains.as_deref());
    if filter.with_purchases {
        qb.push(" AND EXISTS (SELECT 1 FROM purchases p WHERE p.buyer_id = a.id)");
    }
    qb
}

fn sellers_query(select: &str, filter: &SellerFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {select} FROM sellers a WHERE TRUE"));
    push_name_filter(&mut qb, "a.name", filter.name_contains.as_deref());
    if filter.with_items {
        qb.push(" AND EXISTS (SELECT 1 FROM items i WHERE i.seller_id = a.id)");
    }
    if filter.with_sales {
        qb.push(
            " AND EXISTS (SELECT 1 FROM purchases p JOIN items i ON i.id = p.item_id \
             WHERE i.seller_id = a.id)",
        );
    }
    qb
}

fn items_query(select: &str, filter: &ItemFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {select} FROM items i WHERE TRUE"));
    if let Some(seller_id) = filter.seller_id {
        qb.push(" AND i.seller_id = ").push_bind(*seller_id.as_uuid());
    }
    push_name_filter(&mut qb, "i.name", filter.name_contains.as_deref());
    if let Some(min) = filter.min_price {
        qb.push(" AND i.price >= ").push_bind(min.amount());
    }
    if let Some(max) = filter.max_price {
        qb.push(" AND i.price <= ").push_bind(max.amount());
    }
    if filter.available_only {
        qb.push(" AND i.quantity > 0");
    }
    if let Some(max_quantity) = filter.max_quantity {
        qb.push(" AND i.quantity <= ").push_bind(max_quantity);
    }
    qb
}

fn item_order(sort: ItemSort) -> &'static str {
    match sort {
        ItemSort::Newest => "i.listed_at DESC, i.id DESC",
        ItemSort::PriceAsc => "i.price ASC, i.id ASC",
        ItemSort::PriceDesc => "i.price DESC, i.id DESC",
    }
}

fn purchases_query(select: &str, filter: &PurchaseFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {select} FROM purchases p JOIN items i ON i.id = p.item_id WHERE TRUE"
    ));
    if let Some(buyer_id) = filter.buyer_id {
        qb.push(" AND p.buyer_id = ").push_bind(*buyer_id.as_uuid());
    }
    if let Some(item_id) = filter.item_id {
        qb.push(" AND p.item_id = ").push_bind(*item_id.as_uuid());
    }
    if let Some(seller_id) = filter.seller_id {
        qb.push(" AND i.seller_id = ").push_bind(*seller_id.as_uuid());
    }
    if let Some(from) = filter.purchased_from {
        qb.push(" AND p.purchased_at >= ").push_bind(from);
    }
    if let Some(to) = filter.purchased_to {
        qb.push(" AND p.purchased_at <= ").push_bind(to);
    }
    qb
}

const PURCHASE_ORDER: &str = "p.purchased_at DESC, p.id DESC";
const ACCOUNT_ORDER: &str = "a.registered_at ASC, a.id ASC";

fn push_name_filter(qb: &mut QueryBuilder<'static, Postgres>, column: &str, needle: Option<&str>) {
    if let Some(needle) = needle {
        qb.push(format!(" AND {column} ILIKE "))
            .push_bind(format!("%{}%", escape_like(needle)));
    }
}

#[async_trait::async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    async fn find_buyer(&mut self, id: BuyerId) -> Result<Option<Buyer>, StoreError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM buyers a WHERE a.id = $1");
        self.fetch_account("find_buyer", &sql, *id.as_uuid())
            .await?
            .map(Buyer::try_from)
            .transpose()
    }

    async fn find_buyer_by_email(&mut self, email: &Email) -> Result<Option<Buyer>, StoreError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM buyers a WHERE a.email = $1");
        self.fetch_account_by_email("find_buyer_by_email", &sql, email)
            .await?
            .map(Buyer::try_from)
            .transpose()
    }

    async fn buyer_exists(&mut self, id: BuyerId) -> Result<bool, StoreError> {
        self.exists(
            "buyer_exists",
            "SELECT EXISTS (SELECT 1 FROM buyers WHERE id = $1)",
            *id.as_uuid(),
        )
        .await
    }

    #[instrument(level = "debug", skip(self, buyer), fields(buyer_id = %buyer.id), err)]
    async fn save_buyer(&mut self, buyer: &Buyer) -> Result<(), StoreError> {
        self.save_account(
            "save_buyer",
            "buyers",
            *buyer.id.as_uuid(),
            &buyer.name,
            &buyer.email,
            buyer.registered_at,
        )
        .await
    }

    async fn delete_buyer(&mut self, id: BuyerId) -> Result<bool, StoreError> {
        self.delete("delete_buyer", "DELETE FROM buyers WHERE id = $1", *id.as_uuid())
            .await
    }

    async fn list_buyers(
        &mut self,
        filter: &BuyerFilter,
        pagination: Pagination,
    ) -> Result<Page<Buyer>, StoreError> {
        self.page::<AccountRow, Buyer>(
            "list_buyers",
            |select| buyers_query(select, filter),
            ACCOUNT_COLUMNS,
            ACCOUNT_ORDER,
            pagination,
        )
        .await
    }

    async fn count_buyers(&mut self, filter: &BuyerFilter) -> Result<u64, StoreError> {
        self.fetch_count("count_buyers", buyers_query("COUNT(*)", filter))
            .await
    }

    async fn find_seller(&mut self, id: SellerId) -> Result<Option<Seller>, StoreError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM sellers a WHERE a.id = $1");
        self.fetch_account("find_seller", &sql, *id.as_uuid())
            .await?
            .map(Seller::try_from)
            .transpose()
    }

    async fn find_seller_by_email(
        &mut self,
        email: &Email,
    ) -> Result<Option<Seller>, StoreError> {
        let sql = format!("SELECT {ACCOUNT_COLUMNS} FROM sellers a WHERE a.email = $1");
        self.fetch_account_by_email("find_seller_by_email", &sql, email)
            .await?
            .map(Seller::try_from)
            .transpose()
    }

    async fn seller_exists(&mut self, id: SellerId) -> Result<bool, StoreError> {
        self.exists(
            "seller_exists",
            "SELECT EXISTS (SELECT 1 FROM sellers WHERE id = $1)",
            *id.as_uuid(),
        )
        .await
    }

    #[instrument(level = "debug", skip(self, seller), fields(seller_id = %seller.id), err)]
    async fn save_seller(&mut self, seller: &Seller) -> Result<(), StoreError> {
        self.save_account(
            "save_seller",
            "sellers",
            *seller.id.as_uuid(),
            &seller.name,
            &seller.email,
            seller.registered_at,
        )
        .await
    }

    async fn delete_seller(&mut self, id: SellerId) -> Result<bool, StoreError> {
        self.delete("delete_seller", "DELETE FROM sellers WHERE id = $1", *id.as_uuid())
            .await
    }

    async fn list_sellers(
        &mut self,
        filter: &SellerFilter,
        pagination: Pagination,
    ) -> Result<Page<Seller>, StoreError> {
        self.page::<AccountRow, Seller>(
            "list_sellers",
            |select| sellers_query(select, filter),
            ACCOUNT_COLUMNS,
            ACCOUNT_ORDER,
            pagination,
        )
        .await
    }

    async fn count_sellers(&mut self, filter: &SellerFilter) -> Result<u64, StoreError> {
        self.fetch_count("count_sellers", sellers_query("COUNT(*)", filter))
            .await
    }

    async fn find_item(&mut self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items i WHERE i.id = $1");
        sqlx::query_as::<_, ItemRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("find_item", e))?
            .map(Item::try_from)
            .transpose()
    }

    #[instrument(
        level = "debug",
        skip(self),
        fields(item_id = %id, found = tracing::field::Empty),
        err
    )]
    async fn lock_item(&mut self, id: ItemId) -> Result<Option<Item>, StoreError> {
        let sql = format!("SELECT {ITEM_COLUMNS} FROM items i WHERE i.id = $1 FOR UPDATE");
        let item = sqlx::query_as::<_, ItemRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("lock_item", e))?
            .map(Item::try_from)
            .transpose()?;
        Span::current().record("found", item.is_some());
        Ok(item)
    }

    async fn item_exists(&mut self, id: ItemId) -> Result<bool, StoreError> {
        self.exists(
            "item_exists",
            "SELECT EXISTS (SELECT 1 FROM items WHERE id = $1)",
            *id.as_uuid(),
        )
        .await
    }

    #[instrument(
        level = "debug",
        skip(self, item),
        fields(item_id = %item.id, quantity = item.quantity),
        err
    )]
    async fn save_item(&mut self, item: &Item) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO items (id, seller_id, name, description, price, quantity, listed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                description = EXCLUDED.description,
                price = EXCLUDED.price,
                quantity = EXCLUDED.quantity
            "#,
        )
        .bind(*item.id.as_uuid())
        .bind(*item.seller_id.as_uuid())
        .bind(&item.name)
        .bind(item.description.as_deref())
        .bind(item.price.amount())
        .bind(item.quantity)
        .bind(item.listed_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("save_item", e))?;
        Ok(())
    }

    async fn delete_item(&mut self, id: ItemId) -> Result<bool, StoreError> {
        self.delete("delete_item", "DELETE FROM items WHERE id = $1", *id.as_uuid())
            .await
    }

    async fn list_items(
        &mut self,
        filter: &ItemFilter,
        pagination: Pagination,
    ) -> Result<Page<Item>, StoreError> {
        self.page::<ItemRow, Item>(
            "list_items",
            |select| items_query(select, filter),
            ITEM_COLUMNS,
            item_order(filter.sort),
            pagination,
        )
        .await
    }

    async fn count_items(&mut self, filter: &ItemFilter) -> Result<u64, StoreError> {
        self.fetch_count("count_items", items_query("COUNT(*)", filter))
            .await
    }

    async fn find_purchase(&mut self, id: PurchaseId) -> Result<Option<Purchase>, StoreError> {
        let sql = format!("SELECT {PURCHASE_COLUMNS} FROM purchases p WHERE p.id = $1");
        sqlx::query_as::<_, PurchaseRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("find_purchase", e))?
            .map(Purchase::try_from)
            .transpose()
    }

    #[instrument(level = "debug", skip(self), fields(purchase_id = %id), err)]
    async fn lock_purchase(&mut self, id: PurchaseId) -> Result<Option<Purchase>, StoreError> {
        let sql = format!("SELECT {PURCHASE_COLUMNS} FROM purchases p WHERE p.id = $1 FOR UPDATE");
        sqlx::query_as::<_, PurchaseRow>(&sql)
            .bind(*id.as_uuid())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("lock_purchase", e))?
            .map(Purchase::try_from)
            .transpose()
    }

    #[instrument(level = "debug", skip(self, purchase), fields(purchase_id = %purchase.id), err)]
    async fn save_purchase(&mut self, purchase: &Purchase) -> Result<(), StoreError> {
        // Purchases are immutable once written.
        sqlx::query(
            r#"
            INSERT INTO purchases (id, buyer_id, item_id, quantity, unit_price, total_price, purchased_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(*purchase.id.as_uuid())
        .bind(*purchase.buyer_id.as_uuid())
        .bind(*purchase.item_id.as_uuid())
        .bind(purchase.quantity)
        .bind(purchase.unit_price.amount())
        .bind(purchase.total_price.amount())
        .bind(purchase.purchased_at)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("save_purchase", e))?;
        Ok(())
    }

    async fn delete_purchase(&mut self, id: PurchaseId) -> Result<bool, StoreError> {
        self.delete("delete_purchase", "DELETE FROM purchases WHERE id = $1", *id.as_uuid())
            .await
    }

    async fn list_purchases(
        &mut self,
        filter: &PurchaseFilter,
        pagination: Pagination,
    ) -> Result<Page<Purchase>, StoreError> {
        self.page::<PurchaseRow, Purchase>(
            "list_purchases",
            |select| purchases_query(select, filter),
            PURCHASE_COLUMNS,
            PURCHASE_ORDER,
            pagination,
        )
        .await
    }

    async fn count_purchases(&mut self, filter: &PurchaseFilter) -> Result<u64, StoreError> {
        self.fetch_count("count_purchases", purchases_query("COUNT(*)", filter))
            .await
    }

    async fn sum_total_price(&mut self, filter: &PurchaseFilter) -> Result<Money, StoreError> {
        let mut qb = purchases_query("COALESCE(SUM(p.total_price), 0)", filter);
        let sum: Decimal = qb
            .build_query_scalar()
            .fetch_one(&mut *self.tx)
            .await
            .map_err(|e| map_sqlx_error("sum_total_price", e))?;
        Money::new(sum).map_err(|e| StoreError::Decode(e.to_string()))
    }

    async fn most_purchased_items(&mut self, limit: u32) -> Result<Vec<ItemSales>, StoreError> {
        let rows = sqlx::query_as::<_, ItemSalesRow>(
            r#"
            SELECT
                i.id AS item_id,
                i.name AS item_name,
                SUM(p.quantity)::BIGINT AS total_quantity
            FROM purchases p
            JOIN items i ON i.id = p.item_id
            GROUP BY i.id, i.name
            ORDER BY total_quantity DESC, i.name ASC, i.id ASC
            LIMIT $1
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&mut *self.tx)
        .await
        .map_err(|e| map_sqlx_error("most_purchased_items", e))?;

        Ok(rows
            .into_iter()
            .map(|row| ItemSales {
                item_id: ItemId::from_uuid(row.item_id),
                item_name: row.item_name,
                total_quantity: row.total_quantity,
            })
            .collect())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx
            .commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx
            .rollback()
            .await
            .map_err(|e| map_sqlx_error("rollback", e))
    }
}

/// Map SQLx errors to StoreError.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::UniqueViolation(msg),
                Some("23503") => StoreError::ForeignKeyViolation(msg),
                // check_violation, numeric_value_out_of_range
                Some("23514") | Some("22003") => StoreError::CheckViolation(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Decode(format!("{operation}: {err}"))
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

// SQLx row types

#[derive(Debug, FromRow)]
struct AccountRow {
    id: Uuid,
    name: String,
    email: String,
    registered_at: DateTime<Utc>,
}

impl AccountRow {
    fn email(&self) -> Result<Email, StoreError> {
        Email::parse(&self.email)
            .map_err(|e| StoreError::Decode(format!("stored email {}: {e}", self.email)))
    }
}

impl TryFrom<AccountRow> for Buyer {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Buyer {
            id: BuyerId::from_uuid(row.id),
            email: row.email()?,
            name: row.name,
            registered_at: row.registered_at,
        })
    }
}

impl TryFrom<AccountRow> for Seller {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        Ok(Seller {
            id: SellerId::from_uuid(row.id),
            email: row.email()?,
            name: row.name,
            registered_at: row.registered_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ItemRow {
    id: Uuid,
    seller_id: Uuid,
    name: String,
    description: Option<String>,
    price: Decimal,
    quantity: i64,
    listed_at: DateTime<Utc>,
}

impl TryFrom<ItemRow> for Item {
    type Error = StoreError;

    fn try_from(row: ItemRow) -> Result<Self, Self::Error> {
        Ok(Item {
            id: ItemId::from_uuid(row.id),
            seller_id: SellerId::from_uuid(row.seller_id),
            name: row.name,
            description: row.description,
            price: decode_money(row.price)?,
            quantity: row.quantity,
            listed_at: row.listed_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct PurchaseRow {
    id: Uuid,
    buyer_id: Uuid,
    item_id: Uuid,
    quantity: i64,
    unit_price: Decimal,
    total_price: Decimal,
    purchased_at: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for Purchase {
    type Error = StoreError;

    fn try_from(row: PurchaseRow) -> Result<Self, Self::Error> {
        Ok(Purchase {
            id: PurchaseId::from_uuid(row.id),
            buyer_id: BuyerId::from_uuid(row.buyer_id),
            item_id: ItemId::from_uuid(row.item_id),
            quantity: row.quantity,
            unit_price: decode_money(row.unit_price)?,
            total_price: decode_money(row.total_price)?,
            purchased_at: row.purchased_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct ItemSalesRow {
    item_id: Uuid,
    item_name: String,
    total_quantity: i64,
}

fn decode_money(amount: Decimal) -> Result<Money, StoreError> {
    Money::new(amount).map_err(|e| StoreError::Decode(e.to_string()))
}
