use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Set codes the lookup is allowed to filter on.
const KNOWN_SET_CODES: &[&str] = &[
    "LEA", "LEB", "2ED", "3ED", "ARN", "ATQ", "4ED", "ICE", "CHR", "HML", "ALL", "MIR", "VIS",
    "5ED", "POR", "WTH", "TMP", "STH", "EXO", "P02", "UGL", "USG", "ULG", "6ED", "PTK", "S99",
    "MMQ", "BRB", "NEM", "S00", "PCY", "INV", "PLS", "7ED", "ODY", "TOR", "JUD", "ONS", "LGN",
    "8ED", "MRD", "DST", "5DN", "CHK", "BOK", "SOK", "9ED", "RAV", "GPT", "DIS", "CSP", "TSP",
    "PLC", "FUT", "10E", "LRW", "MOR", "SHM", "EVE", "ALA", "CON", "ARB", "M10", "ZEN", "WWK",
    "ROE", "M11", "SOM", "MBS", "NPH", "CMD", "M12", "ISD", "DKA", "AVR", "M13", "RTR", "GTC",
    "DGM", "M14", "THS", "BNG", "JOU", "M15", "KTK", "FRF", "DTK", "ORI", "BFZ", "OGW", "SOI",
    "EMN", "KLD", "AER", "AKH", "HOU", "XLN", "RIX", "DOM", "M19", "GRN", "RNA", "WAR", "MH1",
    "M20", "ELD", "THB", "IKO", "M21", "ZNR", "KHM", "STX", "MH2", "AFR", "MID", "VOW", "NEO",
    "SNC", "DMU", "UNF", "BRO", "ONE", "MOM", "LTR", "LTC", "WOE", "WOT", "LCI", "MKM", "OTJ",
    "MH3", "BLB", "DSK", "FDN",
];

static ALLOW_LIST: Lazy<HashSet<&'static str>> =
    Lazy::new(|| KNOWN_SET_CODES.iter().copied().collect());

/// 回傳白名單中的標準代碼 (大寫)；不在白名單內或未提供時回傳 `None`
pub fn trusted_set_code(code: Option<&str>) -> Option<&'static str> {
    let normalized = code?.trim().to_ascii_uppercase();
    ALLOW_LIST.get(normalized.as_str()).copied()
}
