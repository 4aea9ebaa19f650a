//! Discovery of the live instance set through a TXT record.
//!
//! The query goes to a single server, the first one in the system resolver
//! configuration unless the caller names one. The message is built by hand so
//! that EDNS0 (4096 byte buffer, DO bit) and RD are set exactly, then sent
//! through the hickory client, which randomises the ID and matches the reply.
//! The response code and answer count are checked before any probe starts.

use crate::{error::SetupError, types::Endpoint};
use futures::StreamExt;
use hickory_client::client::Client;
use hickory_proto::{
    op::{Edns, Message, MessageType, OpCode, Query, ResponseCode},
    rr::{Name, RData, RecordType},
    runtime::TokioRuntimeProvider,
    udp::UdpClientStream,
    xfer::{DnsHandle, DnsRequest, DnsRequestOptions, DnsResponse},
    ProtoError,
};
use std::{net::SocketAddr, time::Duration};
use tracing::debug;

/// Name whose TXT set lists the public instances.
pub const BOOTSTRAP_NAME: &str = "existing-dns-lg.bortzmeyer.fr.";

const EDNS_PAYLOAD: u16 = 4096;
const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(5);

/// First name server from the system configuration (`/etc/resolv.conf` on Unix).
pub fn system_name_server() -> Result<SocketAddr, SetupError> {
    let (config, _opts) = hickory_resolver::system_conf::read_system_conf()
        .map_err(|e| SetupError::ResolverConfig(e.to_string()))?;
    config
        .name_servers()
        .first()
        .map(|ns| ns.socket_addr)
        .ok_or(SetupError::NoNameServer)
}

/// The client transport assigns a random ID when the message is sent.
pub fn build_txt_query(name: &Name) -> Message {
    let mut message = Message::new();
    message
        .set_message_type(MessageType::Query)
        .set_op_code(OpCode::Query)
        .set_recursion_desired(true)
        .add_query(Query::query(name.clone(), RecordType::TXT));

    let mut edns = Edns::new();
    edns.set_max_payload(EDNS_PAYLOAD);
    edns.set_dnssec_ok(true);
    message.set_edns(edns);
    message
}

/// Pulls endpoint URLs out of a bootstrap response.
///
/// Each TXT answer contributes its first character-string. Other record
/// types in the answer section (RRSIG when the zone is signed) are skipped.
pub fn endpoints_from_response(name: &str, response: &Message) -> Result<Vec<Endpoint>, SetupError> {
    if response.response_code() != ResponseCode::NoError {
        return Err(SetupError::ResponseCode(response.response_code().to_string()));
    }
    if response.answers().is_empty() {
        return Err(SetupError::NoAnswer(name.to_string()));
    }

    let endpoints: Vec<Endpoint> = response
        .answers()
        .iter()
        .filter_map(|record| match record.data() {
            RData::TXT(txt) => txt
                .txt_data()
                .first()
                .map(|first| Endpoint::new(String::from_utf8_lossy(first).into_owned())),
            other => {
                debug!(record_type = %other.record_type(), "ignoring non-TXT answer");
                None
            }
        })
        .collect();

    if endpoints.is_empty() {
        return Err(SetupError::NoEndpoints(name.to_string()));
    }
    Ok(endpoints)
}

async fn exchange(query: Message, server: SocketAddr) -> Result<DnsResponse, ProtoError> {
    let stream = UdpClientStream::builder(server, TokioRuntimeProvider::default()).build();
    let (client, background) = Client::connect(stream).await?;
    tokio::spawn(background);

    let mut responses = client.send(DnsRequest::new(query, DnsRequestOptions::default()));
    match tokio::time::timeout(EXCHANGE_TIMEOUT, responses.next()).await {
        Ok(Some(response)) => response,
        Ok(None) => Err(ProtoError::from("no response")),
        Err(_) => Err(ProtoError::from("i/o timeout")),
    }
}

/// Looks up `name` (normally [`BOOTSTRAP_NAME`]) and returns the advertised instances.
pub async fn bootstrap_endpoints(name: &str, server: Option<SocketAddr>) -> Result<Vec<Endpoint>, SetupError> {
    let server = match server {
        Some(server) => server,
        None => system_name_server()?,
    };
    let exchange_error = |reason: String| SetupError::Exchange {
        name: name.to_string(),
        server,
        reason,
    };

    let qname = Name::from_ascii(name).map_err(|e| exchange_error(e.to_string()))?;
    let query = build_txt_query(&qname);
    debug!(%qname, %server, "bootstrap TXT query");

    let response = exchange(query, server)
        .await
        .map_err(|e| exchange_error(e.to_string()))?;
    endpoints_from_response(name, &response)
}
