use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppInfoResponse {
    pub product_name: String,
    pub version: String,
    pub api_base_url: String,
    pub platform: String,
    pub arch: String,
}

pub fn build_app_info_response(
    product_name: String,
    version: String,
    api_base_url: String,
) -> AppInfoResponse {
    AppInfoResponse {
        product_name,
        version,
        api_base_url,
        platform: std::env::consts::OS.to_string(),
        arch: std::env::consts::ARCH.to_string(),
    }
}

pub fn app_info(api_base_url: &str) -> AppInfoResponse {
    build_app_info_response(
        env!("CARGO_PKG_NAME").to_string(),
        env!("CARGO_PKG_VERSION").to_string(),
        api_base_url.to_string(),
    )
}
