use sn_core::db::{self, Database};
use sn_core::migrations;

use crate::accounts::{self, Account};
use crate::content;
use crate::types::Role;

pub(crate) const PASSWORD: &str = "password123";

pub(crate) async fn database() -> Database {
    let pool = db::connect_in_memory().await.expect("in-memory pool");
    migrations::run(&pool).await.expect("migrations");
    Database::new(pool)
}

pub(crate) async fn account(db: &Database, username: &str, role: Role) -> Account {
    accounts::create_account(db, username, PASSWORD, role)
        .await
        .expect("create account")
}

pub(crate) async fn post(db: &Database, author: &Account, body: &str) -> String {
    content::create_post(db, &author.account_id, body)
        .await
        .expect("create post")
        .post_id
}
