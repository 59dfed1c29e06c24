//! Read-only access to the Stylish store

use crate::types::{OrderRecord, ProductDetailRow, ProductTitle, UserRecord};
use crate::{Error, Result};
use parking_lot::Mutex;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension, Row};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Tables and columns the adapter reads.
///
/// Mirrors the Stylish backend layout; seeded fixtures use it verbatim.
pub const SCHEMA: &str = r#"
    CREATE TABLE product (
        id INTEGER PRIMARY KEY,
        category TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        price INTEGER NOT NULL,
        texture TEXT,
        wash TEXT,
        place TEXT,
        note TEXT,
        story TEXT,
        main_image TEXT
    );

    CREATE TABLE product_images (
        id INTEGER PRIMARY KEY,
        product_id INTEGER NOT NULL,
        image TEXT NOT NULL
    );

    CREATE TABLE color (
        id INTEGER PRIMARY KEY,
        code TEXT NOT NULL,
        name TEXT NOT NULL
    );

    CREATE TABLE variant (
        id INTEGER PRIMARY KEY,
        product_id INTEGER NOT NULL,
        color_id INTEGER NOT NULL,
        size TEXT NOT NULL,
        stock INTEGER NOT NULL
    );

    CREATE TABLE user (
        id INTEGER PRIMARY KEY,
        provider TEXT NOT NULL,
        email TEXT NOT NULL UNIQUE,
        password TEXT,
        name TEXT NOT NULL,
        picture TEXT,
        access_token TEXT
    );

    CREATE TABLE order_table (
        id INTEGER PRIMARY KEY,
        number TEXT NOT NULL UNIQUE,
        time INTEGER NOT NULL,
        status INTEGER NOT NULL,
        details TEXT NOT NULL,
        user_id INTEGER NOT NULL,
        total INTEGER NOT NULL
    );
"#;

/// Read-only view of the backing store used to derive expected results.
///
/// Every "by key" lookup returns exactly one record or [`Error::NotFound`];
/// nothing here writes.
pub trait DataSource: Send + Sync {
    /// `id, category, title` for every product, in id order
    fn product_titles(&self) -> Result<Vec<ProductTitle>>;

    /// Joined product/image/variant/color rows, optionally for one product
    fn product_details(&self, product_id: Option<i64>) -> Result<Vec<ProductDetailRow>>;

    /// Color name → color code
    fn color_codes(&self) -> Result<BTreeMap<String, String>>;

    /// Public profile of the user registered with `email`
    fn user_record(&self, email: &str) -> Result<UserRecord>;

    /// Session token stored for `email`; `""` once logged out
    fn access_token(&self, email: &str) -> Result<String>;

    /// Persisted order by its public number
    fn order_by_number(&self, number: &str) -> Result<OrderRecord>;
}

/// SQLite-backed [`DataSource`]
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open the store at `path` without write access
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        info!("Opened store at {:?} (read-only)", path.as_ref());
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Wrap an existing connection, switching it to query-only mode
    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "query_only", true)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }
}

impl DataSource for Database {
    fn product_titles(&self) -> Result<Vec<ProductTitle>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT id, category, title FROM product ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            Ok(ProductTitle {
                id: row.get(0)?,
                category: row.get(1)?,
                title: row.get(2)?,
            })
        })?;

        let titles = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        debug!("Loaded {} product titles", titles.len());
        Ok(titles)
    }

    fn product_details(&self, product_id: Option<i64>) -> Result<Vec<ProductDetailRow>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            r#"
            SELECT product.id, product.category, product.title, product.description,
                   product.price, product.texture, product.wash, product.place,
                   product.note, product.story, product.main_image,
                   product_images.id, product_images.image,
                   variant.id, color.id, color.code, color.name, variant.size, variant.stock
              FROM product
                   INNER JOIN product_images ON product_images.product_id = product.id
                   INNER JOIN variant ON variant.product_id = product.id
                   INNER JOIN color ON color.id = variant.color_id
             WHERE ?1 IS NULL OR product.id = ?1
             ORDER BY product.id, product_images.id, variant.id
            "#,
        )?;

        let rows = stmt.query_map(params![product_id], |row| {
            Ok(ProductDetailRow {
                id: row.get(0)?,
                category: text(row, 1)?,
                title: text(row, 2)?,
                description: text(row, 3)?,
                price: row.get(4)?,
                texture: text(row, 5)?,
                wash: text(row, 6)?,
                place: text(row, 7)?,
                note: text(row, 8)?,
                story: text(row, 9)?,
                main_image: text(row, 10)?,
                image_id: row.get(11)?,
                image: text(row, 12)?,
                variant_id: row.get(13)?,
                color_id: row.get(14)?,
                color_code: text(row, 15)?,
                color_name: text(row, 16)?,
                size: text(row, 17)?,
                stock: row.get(18)?,
            })
        })?;

        let details = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        debug!(
            "Loaded {} product detail rows (product filter: {:?})",
            details.len(),
            product_id
        );
        Ok(details)
    }

    fn color_codes(&self) -> Result<BTreeMap<String, String>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT name, code FROM color ORDER BY id")?;

        let rows = stmt.query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?;

        let mut codes = BTreeMap::new();
        for row in rows {
            let (name, code) = row?;
            codes.insert(name, code);
        }
        Ok(codes)
    }

    fn user_record(&self, email: &str) -> Result<UserRecord> {
        let conn = self.conn.lock();

        conn.query_row(
            "SELECT id, provider, email, name, picture FROM user WHERE email = ?1",
            params![email],
            |row| {
                Ok(UserRecord {
                    id: row.get(0)?,
                    provider: row.get(1)?,
                    email: row.get(2)?,
                    name: row.get(3)?,
                    picture: row.get(4)?,
                })
            },
        )
        .optional()?
        .ok_or_else(|| Error::not_found("user", email))
    }

    fn access_token(&self, email: &str) -> Result<String> {
        let conn = self.conn.lock();

        let token: Option<Option<String>> = conn
            .query_row(
                "SELECT access_token FROM user WHERE email = ?1",
                params![email],
                |row| row.get(0),
            )
            .optional()?;

        match token {
            Some(token) => Ok(token.unwrap_or_default()),
            None => Err(Error::not_found("user", email)),
        }
    }

    fn order_by_number(&self, number: &str) -> Result<OrderRecord> {
        let conn = self.conn.lock();

        let raw = conn
            .query_row(
                "SELECT id, number, time, status, details, user_id, total
                   FROM order_table WHERE number = ?1",
                params![number],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        scalar_string(row.get(1)?),
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i64>(5)?,
                        row.get::<_, i64>(6)?,
                    ))
                },
            )
            .optional()?
            .ok_or_else(|| Error::not_found("order", number))?;

        let (id, number, time, status, details, user_id, total) = raw;
        Ok(OrderRecord {
            id,
            number,
            time,
            status,
            details: serde_json::from_str(&details)?,
            user_id,
            total,
        })
    }
}

/// Nullable text column, NULL read as ""
fn text(row: &Row<'_>, idx: usize) -> rusqlite::Result<String> {
    Ok(row.get::<_, Option<String>>(idx)?.unwrap_or_default())
}

/// Order numbers are numeric in some deployments and text in others
fn scalar_string(value: SqlValue) -> String {
    match value {
        SqlValue::Integer(i) => i.to_string(),
        SqlValue::Real(f) => f.to_string(),
        SqlValue::Text(s) => s,
        SqlValue::Null | SqlValue::Blob(_) => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> Database {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO color (id, code, name) VALUES (1, 'FFFFFF', '白色'), (2, 'DDFFBB', '亮綠');
            INSERT INTO product VALUES
                (201807201824, 'women', '前開衩扭結洋裝', '厚薄：薄', 799, '棉 100%', '手洗', '中國', NULL, '故事', 'main.jpg'),
                (201807242211, 'men', '純色輕薄百搭襯衫', '厚薄：薄', 1299, '棉 100%', '手洗', '中國', '', '故事', 'main.jpg');
            INSERT INTO product_images (id, product_id, image) VALUES
                (11, 201807201824, '0.jpg'), (12, 201807201824, '1.jpg'), (21, 201807242211, '0.jpg');
            INSERT INTO variant (id, product_id, color_id, size, stock) VALUES
                (101, 201807201824, 1, 'S', 2), (102, 201807201824, 2, 'M', 5), (201, 201807242211, 1, 'L', 0);
            INSERT INTO user (id, provider, email, password, name, picture, access_token) VALUES
                (1, 'native', 'user0@example', 'x', 'user0', NULL, 'token-0'),
                (2, 'native', 'user1@example', 'x', 'user1', 'p.png', NULL);
            INSERT INTO order_table VALUES
                (5, '71223749413', 1671000000, 0, '{"shipping":"delivery","total":829}', 1, 829);
            "#,
        )
        .unwrap();
        Database::from_connection(conn).unwrap()
    }

    #[test]
    fn test_product_details_cross_product() {
        let db = seeded();

        let rows = db.product_details(Some(201807201824)).unwrap();
        // 2 images x 2 variants
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0].image_id, 11);
        assert_eq!(rows[0].variant_id, 101);
        assert_eq!(rows[1].variant_id, 102);
        assert_eq!(rows[0].note, "");

        let all = db.product_details(None).unwrap();
        assert_eq!(all.len(), 5);
        assert!(all.windows(2).all(|w| w[0].id <= w[1].id));
    }

    #[test]
    fn test_missing_product_yields_no_rows() {
        let db = seeded();
        assert!(db.product_details(Some(123)).unwrap().is_empty());
    }

    #[test]
    fn test_user_lookup() {
        let db = seeded();

        let user = db.user_record("user1@example").unwrap();
        assert_eq!(user.id, 2);
        assert_eq!(user.picture.as_deref(), Some("p.png"));

        let err = db.user_record("nobody@example").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_access_token_null_reads_empty() {
        let db = seeded();
        assert_eq!(db.access_token("user0@example").unwrap(), "token-0");
        assert_eq!(db.access_token("user1@example").unwrap(), "");
        assert!(db.access_token("nobody@example").unwrap_err().is_not_found());
    }

    #[test]
    fn test_order_details_decoded() {
        let db = seeded();

        let order = db.order_by_number("71223749413").unwrap();
        assert_eq!(order.total, 829);
        assert_eq!(order.details["shipping"], "delivery");

        assert!(db.order_by_number("123").unwrap_err().is_not_found());
    }

    #[test]
    fn test_color_codes() {
        let db = seeded();
        let codes = db.color_codes().unwrap();
        assert_eq!(codes.get("白色").map(String::as_str), Some("FFFFFF"));
        assert_eq!(codes.len(), 2);
    }

    #[test]
    fn test_store_is_query_only() {
        let db = seeded();
        let conn = db.conn.lock();
        let result = conn.execute("DELETE FROM product", []);
        assert!(result.is_err());
    }

    #[test]
    fn test_open_read_only_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stylish.db");
        {
            let conn = Connection::open(&path).unwrap();
            conn.execute_batch(SCHEMA).unwrap();
        }

        let db = Database::open(&path).unwrap();
        assert!(db.product_titles().unwrap().is_empty());
        assert!(db.conn.lock().execute("DELETE FROM product", []).is_err());
    }
}
