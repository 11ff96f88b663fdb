use anyhow::Result;

use crate::TestPostgresContainer;

/// Insert a user row directly and return its id
pub async fn create_test_user_with_name(
    container: &TestPostgresContainer, name: &str,
) -> Result<i64> {
    let email = format!("{}@example.com", name.to_lowercase().replace(' ', ""));
    let client = container.pool.get().await?;
    let row = client
        .query_one(
            "INSERT INTO users (name, email) VALUES ($1, $2) RETURNING id",
            &[&name, &email],
        )
        .await?;
    Ok(row.get("id"))
}

/// Create a test user named "Test User" and return its id
pub async fn create_test_user(container: &TestPostgresContainer) -> Result<i64> {
    create_test_user_with_name(container, "Test User").await
}

/// Create two test users and return their ids
pub async fn create_test_users(
    container: &TestPostgresContainer,
) -> Result<(i64, i64)> {
    let alice = create_test_user_with_name(container, "Alice").await?;
    let bob = create_test_user_with_name(container, "Bob").await?;
    Ok((alice, bob))
}

/// Remove all user rows
pub async fn clean_test_data(container: &TestPostgresContainer) -> Result<()> {
    container.execute_sql("DELETE FROM users").await
}
