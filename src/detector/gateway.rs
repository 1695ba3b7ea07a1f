//! UPnP `GetExternalIPAddress` query against a local internet gateway.

use crate::error::{DdnsError, Result};
use regex::Regex;
use std::sync::OnceLock;

const SOAP_ACTION: &str = "urn:schemas-upnp-org:service:WANIPConnection:1#GetExternalIPAddress";

const SOAP_BODY: &str = "<?xml version='1.0' encoding='utf-8'?> \
<s:Envelope s:encodingStyle='http://schemas.xmlsoap.org/soap/encoding/' \
xmlns:s='http://schemas.xmlsoap.org/soap/envelope/'> <s:Body> \
<u:GetExternalIPAddress xmlns:u='urn:schemas-upnp-org:service:WANIPConnection:1' /> \
</s:Body> </s:Envelope>";

/// Control URL of the WAN IP service for a gateway address (host or IP).
pub fn control_url(gateway: &str) -> String {
    format!("http://{}:49000/igdupnp/control/WANIPConn1", gateway)
}

fn address_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)<NewExternalIPAddress>(.*?)</NewExternalIPAddress>")
            .unwrap_or_else(|e| unreachable!("static pattern is valid: {e}"))
    })
}

/// Every `NewExternalIPAddress` value found in a SOAP response body.
pub fn extract_addresses(body: &str) -> Vec<String> {
    address_pattern()
        .captures_iter(body)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .collect()
}

/// Send the control request and return the raw response body.
pub async fn query(client: &reqwest::Client, url: &str) -> Result<String> {
    let response = client
        .post(url)
        .header("Content-Type", "text/xml; charset=\"utf-8\"")
        .header("SoapAction", SOAP_ACTION)
        .body(SOAP_BODY)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(DdnsError::IpDetection(format!(
            "HTTP {} from {}",
            response.status(),
            url
        )));
    }

    Ok(response.text().await?)
}
