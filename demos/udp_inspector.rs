//! Example: Inspecting PRUDP traffic on a UDP socket
//!
//! Binds a socket, decodes every datagram it receives into a PRUDP packet
//! and, for DATA packets, tries to unwrap the RMC request inside. A sample
//! request is sent to the socket at startup so the output is never empty.
//!
//! Run with: `cargo run --example udp_inspector -- 127.0.0.1:60000`

#![allow(clippy::uninlined_format_args)]

use futures::StreamExt;
use prudp_protocol::config::{LoggingConfig, ProtocolConfig};
use prudp_protocol::core::codec::PrudpDecoder;
use prudp_protocol::core::packet::PacketType;
use prudp_protocol::service::RmcPipeline;
use prudp_protocol::utils::logging::init_logging;
use tokio::net::UdpSocket;
use tokio_util::udp::UdpFramed;

/// A DATA packet from port 4/1 carrying a deflate-framed RMC request
fn sample_datagram(pipeline: &RmcPipeline) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
    let parameters = b"inspector sample parameters, inspector sample parameters";
    // Parameters start at absolute offset size - 13, right after the header
    let mut request = 26u32.to_le_bytes().to_vec();
    request.push(0x80 | 0x0A);
    request.extend_from_slice(&1u32.to_le_bytes());
    request.extend_from_slice(&2u32.to_le_bytes());
    request.extend_from_slice(parameters);
    let payload = pipeline.compression().compress(&request)?;

    let mut datagram = vec![0xEA, 0xD0];
    datagram.extend_from_slice(&(payload.len() as u16).to_le_bytes());
    datagram.extend_from_slice(&[0x41, 0x3F]);
    datagram.extend_from_slice(&((0x002u16 << 4) | 2).to_le_bytes());
    datagram.extend_from_slice(&[0x05, 0x00]);
    datagram.extend_from_slice(&1u16.to_le_bytes());
    datagram.extend_from_slice(&[0u8; 16]);
    datagram.extend_from_slice(&[1, 16]);
    datagram.extend_from_slice(&[0xC5; 16]);
    datagram.extend_from_slice(&payload);
    datagram.push(0);
    Ok(datagram)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ProtocolConfig::from_env()?;
    config.validate_strict()?;
    init_logging(&LoggingConfig {
        app_name: "udp-inspector".to_string(),
        ..config.logging.clone()
    })?;

    let addr = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "127.0.0.1:60000".to_string());
    let socket = UdpSocket::bind(&addr).await?;
    let local = socket.local_addr()?;
    println!("=== PRUDP inspector listening on {} ===\n", local);

    let pipeline = RmcPipeline::from_config(&config.codec);

    let sender = UdpSocket::bind("127.0.0.1:0").await?;
    sender.send_to(&sample_datagram(&pipeline)?, local).await?;

    let mut frames = UdpFramed::new(socket, PrudpDecoder);
    while let Some(frame) = frames.next().await {
        let (packet, peer) = match frame {
            Ok(frame) => frame,
            Err(e) => {
                println!("malformed datagram: {}", e);
                continue;
            }
        };

        println!(
            "{} {} -> {} type={:?} flags={:#05x} session={} seq={} payload={}B",
            peer,
            packet.source,
            packet.destination,
            packet.kind(),
            packet.flags.raw(),
            packet.session_id,
            packet.sequence_id,
            packet.payload.len()
        );
        if let Some(signature) = packet.connection_signature() {
            println!("  connection signature: {:02x?}", signature);
        }
        if let Some(fragment) = packet.fragment_id() {
            println!("  fragment id: {:02x?}", fragment);
        }

        if packet.kind() != Some(PacketType::Data) || packet.payload.is_empty() {
            continue;
        }
        match pipeline.decode_request(&packet) {
            Ok(request) => println!(
                "  RMC protocol={:#04x} call={} method={} parameters={}B",
                request.protocol_id,
                request.call_id,
                request.method_id,
                request.parameters.len()
            ),
            Err(e) => println!("  payload is not an RMC request: {}", e),
        }
        pipeline.metrics().log_metrics();
    }

    Ok(())
}
