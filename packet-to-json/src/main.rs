//! This tool allows converting a captured binary AMF remoting packet to a
//! JSON document for easy previewing, as well as the creation of test cases
//! for the amf-remoting library

#![deny(missing_docs, clippy::missing_docs_in_private_items)]

use amf_remoting::packet::{read, Packet};
use clap::{Arg, Command};
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let matched = Command::new("Packet -> json converter")
        .version("1.0")
        .arg(
            Arg::new("INPUT")
                .help("The packet capture to convert")
                .required(true),
        )
        .get_matches();

    let file_name = matched
        .get_one::<String>("INPUT")
        .expect("INPUT is required");

    let data = std::fs::read(PathBuf::from(file_name))?;

    match parse_packet(&data) {
        Ok(packet) => {
            let json = serde_json::to_string(&packet).expect("Unable to encode packet as json");
            println!("{}", json);
        }
        Err(e) => {
            eprintln!("Couldn't read packet capture");
            eprintln!("Error = {:?}", e);
        }
    }

    Ok(())
}

/// Parse a given slice into a packet
fn parse_packet(data: &[u8]) -> Result<Packet, Box<dyn std::error::Error + '_>> {
    let packet = read::parse(data)?;
    Ok(packet)
}
