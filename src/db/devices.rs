use super::models::KnownDevice;
use super::DbPool;

/// List every known device identity. The reconciler matches these by MAC;
/// this table is managed elsewhere and never written here.
pub async fn list_known_devices(pool: &DbPool) -> anyhow::Result<Vec<KnownDevice>> {
    let devices = sqlx::query_as::<_, KnownDevice>(
        r#"
        SELECT id, mac, name, device_type
        FROM devices
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(devices)
}
