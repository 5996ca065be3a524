//! Utility library for the MASTICC trace processing

pub mod pcap_utils;
