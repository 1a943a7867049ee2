pub const COINGECKO_BASE_URL: &str = "https://api.coingecko.com/api/v3";
pub const MARKETS_PAGE_SIZE: u16 = 100;

const MARKETS_QUERY: &str = "vs_currency=usd&order=market_cap_desc&sparkline=true&price_change_percentage=1h,24h,7d";

fn trimmed(base_url: &str) -> &str {
    base_url.trim_end_matches('/')
}

pub fn markets_endpoint(base_url: &str) -> String {
    format!(
        "{}/coins/markets?{MARKETS_QUERY}&per_page={MARKETS_PAGE_SIZE}&page=1",
        trimmed(base_url)
    )
}

pub fn markets_by_ids_endpoint(base_url: &str, ids: &[String]) -> String {
    format!(
        "{}/coins/markets?{MARKETS_QUERY}&ids={}",
        trimmed(base_url),
        ids.join(",")
    )
}

pub fn detail_endpoint(base_url: &str, id: &str) -> String {
    format!(
        "{}/coins/{id}?localization=false&tickers=true&market_data=true&community_data=false&developer_data=false&sparkline=false",
        trimmed(base_url)
    )
}

pub fn market_chart_endpoint(base_url: &str, id: &str, days: u32) -> String {
    format!(
        "{}/coins/{id}/market_chart?vs_currency=usd&days={days}",
        trimmed(base_url)
    )
}

pub fn global_endpoint(base_url: &str) -> String {
    format!("{}/global", trimmed(base_url))
}
