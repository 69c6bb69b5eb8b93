//! Scripted command server speaking the kwire wire protocol.

use std::io::{Read, Write};
use std::thread::{self, JoinHandle};

use bytes::BytesMut;
use kwire_frame::encode_envelope;

pub const CATALOG: &str = r#"[
    {"name": "KServer", "id": 1, "commands": [
        {"name": "get_cmds", "id": 1, "args": [], "ret_type": "std::string"}
    ]},
    {"name": "Common", "id": 2, "commands": [
        {"name": "set_led", "id": 0, "args": [{"type": "uint32_t", "name": "value"}], "ret_type": null},
        {"name": "get_led", "id": 1, "args": [], "ret_type": "uint32_t"},
        {"name": "get_temperature", "id": 2, "args": [], "ret_type": "float"}
    ]},
    {"name": "Oscillo", "id": 4, "commands": [
        {"name": "set_offset", "id": 0, "args": [{"type": "int16_t"}, {"type": "double"}], "ret_type": "void"},
        {"name": "read_all", "id": 1, "args": [], "ret_type": "std::array<float, 8>"},
        {"name": "set_dac", "id": 2, "args": [{"type": "std::vector<uint32_t>"}, {"type": "uint32_t"}], "ret_type": "uint32_t"},
        {"name": "get_status", "id": 3, "args": [], "ret_type": "std::tuple<unsigned int, float>"}
    ]}
]"#;

/// One request as received by the fake server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub device_id: u16,
    pub command_id: u16,
    pub payload: Vec<u8>,
}

/// Read one request frame, or `None` once the client hangs up.
pub fn read_request(stream: &mut impl Read) -> Option<Request> {
    let mut header = [0u8; 12];
    stream.read_exact(&mut header).ok()?;
    assert_eq!(&header[..4], [0, 0, 0, 0], "reserved request field must be zero");

    let device_id = u16::from_be_bytes([header[4], header[5]]);
    let command_id = u16::from_be_bytes([header[6], header[7]]);
    let len = u32::from_be_bytes([header[8], header[9], header[10], header[11]]) as usize;
    let mut payload = vec![0u8; len];
    stream.read_exact(&mut payload).ok()?;
    Some(Request {
        device_id,
        command_id,
        payload,
    })
}

pub fn write_reply(stream: &mut impl Write, payload: &[u8]) {
    let mut wire = BytesMut::new();
    encode_envelope(payload, &mut wire);
    stream.write_all(&wire).expect("reply should be written");
}

/// Serve the catalog on bootstrap, then answer every request with
/// `handler`. Returns every request seen, bootstrap included.
pub fn spawn_server<S, F>(mut stream: S, mut handler: F) -> JoinHandle<Vec<Request>>
where
    S: Read + Write + Send + 'static,
    F: FnMut(&Request) -> Option<Vec<u8>> + Send + 'static,
{
    thread::spawn(move || {
        let mut seen = Vec::new();
        while let Some(request) = read_request(&mut stream) {
            let reply = if (request.device_id, request.command_id) == (1, 1) {
                let mut catalog = CATALOG.as_bytes().to_vec();
                catalog.push(0);
                Some(catalog)
            } else {
                handler(&request)
            };
            if let Some(reply) = reply {
                write_reply(&mut stream, &reply);
            }
            seen.push(request);
        }
        seen
    })
}
