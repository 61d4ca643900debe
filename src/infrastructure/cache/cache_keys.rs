pub fn idempotency_key(key: &str) -> String {
    format!("idempotency:{}", key)
}
