//! Video-server sniffing by keyword
//!
//! Sites label their mirrors inconsistently ("FM", "filemoon.sx", "Moon HD",
//! an iframe on a rotating domain...), so servers are identified by matching
//! lowercase keywords against the embed URL or label. Table order is
//! priority: specific names come before short generic ones.

use serde::Serialize;

/// Known third-party video hosts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum HostKind {
    StreamWish,
    VidHide,
    FileLions,
    Filemoon,
    StreamTape,
    Dood,
    Voe,
    Mp4Upload,
    MixDrop,
    OkRu,
    Uqload,
    Upstream,
    StreamLare,
    YourUpload,
    BurstCloud,
    VidMoly,
    SendVid,
    VidGuard,
    StreamSB,
    LuluStream,
    Vidoza,
    Dailymotion,
    GoogleDrive,
    MediaFire,
    PixelDrain,
    MegaCloud,
    GogoStream,
    Mega,
    Fastream,
    Vudeo,
    Sibnet,
    YourVid,
}

const HOSTS: &[(HostKind, &[&str])] = &[
    (
        HostKind::StreamWish,
        &[
            "streamwish", "strwish", "wishembed", "embedwish", "awish", "dwish", "swdyu",
            "wishfast", "sfastwish", "playerwish", "streamhg", "hlswish", "swish",
        ],
    ),
    (HostKind::FileLions, &["filelions", "alions", "lion"]),
    (
        HostKind::VidHide,
        &["vidhide", "vidhidepro", "vidhidevip", "dhtpre", "peytonepre", "smoothpre", "nika"],
    ),
    (
        HostKind::Filemoon,
        &["filemoon", "moonplayer", "kerapoxy", "moonmov", "fmoon", "bysesayeveum"],
    ),
    (
        HostKind::StreamTape,
        &["streamtape", "strtape", "stape", "tapecontent", "streamta.pe", "shavetape"],
    ),
    (
        HostKind::Dood,
        &["dood", "ds2play", "ds2video", "d0o0d", "do0od", "d000d", "dooood", "vidply", "all3do", "doply"],
    ),
    (HostKind::Mp4Upload, &["mp4upload"]),
    (HostKind::MixDrop, &["mixdrop", "mixdrp", "mxdrop", "mixdroop", "mdbekjwqa", "mdy48tn97"]),
    (HostKind::OkRu, &["ok.ru", "okru", "odnoklassniki"]),
    (HostKind::Uqload, &["uqload"]),
    (HostKind::Upstream, &["upstream"]),
    (HostKind::StreamLare, &["streamlare", "slmaxed", "sltube"]),
    (HostKind::YourUpload, &["yourupload", "yupload"]),
    (HostKind::BurstCloud, &["burstcloud", "burst"]),
    (HostKind::VidMoly, &["vidmoly"]),
    (HostKind::SendVid, &["sendvid"]),
    (
        HostKind::VidGuard,
        &["vidguard", "vgfplay", "vgembed", "vembed", "listeamed", "bembed", "v6embed", "moflix"],
    ),
    (
        HostKind::StreamSB,
        &["streamsb", "sbplay", "sbembed", "sbfull", "sbanh", "sbthe", "watchsb", "sbchill", "embedsb"],
    ),
    (HostKind::LuluStream, &["lulustream", "luluvdo", "lulu"]),
    (HostKind::Vidoza, &["vidoza"]),
    (HostKind::Dailymotion, &["dailymotion", "dai.ly"]),
    (HostKind::GoogleDrive, &["drive.google", "docs.google", "gdrive"]),
    (HostKind::MediaFire, &["mediafire"]),
    (HostKind::PixelDrain, &["pixeldrain"]),
    (HostKind::MegaCloud, &["megacloud", "rapid-cloud", "rabbitstream", "vidcloud"]),
    (HostKind::GogoStream, &["gogo", "anitaku", "embtaku", "playtaku", "goone"]),
    (HostKind::Mega, &["mega.nz", "mega.co.nz"]),
    (HostKind::Fastream, &["fastream"]),
    (HostKind::Vudeo, &["vudeo"]),
    (HostKind::Sibnet, &["sibnet"]),
    (HostKind::YourVid, &["yourvid", "embedyourvid"]),
    (HostKind::Voe, &["voe.sx", "voe", "launchreliantcleaverriver", "jennifercertaindevelop"]),
];

impl HostKind {
    /// Display name used as a video label prefix
    pub fn label(&self) -> &'static str {
        match self {
            HostKind::StreamWish => "StreamWish",
            HostKind::VidHide => "VidHide",
            HostKind::FileLions => "FileLions",
            HostKind::Filemoon => "Filemoon",
            HostKind::StreamTape => "StreamTape",
            HostKind::Dood => "DoodStream",
            HostKind::Voe => "Voe",
            HostKind::Mp4Upload => "Mp4Upload",
            HostKind::MixDrop => "MixDrop",
            HostKind::OkRu => "Okru",
            HostKind::Uqload => "Uqload",
            HostKind::Upstream => "Upstream",
            HostKind::StreamLare => "StreamLare",
            HostKind::YourUpload => "YourUpload",
            HostKind::BurstCloud => "BurstCloud",
            HostKind::VidMoly => "VidMoly",
            HostKind::SendVid => "SendVid",
            HostKind::VidGuard => "VidGuard",
            HostKind::StreamSB => "StreamSB",
            HostKind::LuluStream => "LuluStream",
            HostKind::Vidoza => "Vidoza",
            HostKind::Dailymotion => "Dailymotion",
            HostKind::GoogleDrive => "GoogleDrive",
            HostKind::MediaFire => "MediaFire",
            HostKind::PixelDrain => "PixelDrain",
            HostKind::MegaCloud => "MegaCloud",
            HostKind::GogoStream => "GogoStream",
            HostKind::Mega => "Mega",
            HostKind::Fastream => "Fastream",
            HostKind::Vudeo => "Vudeo",
            HostKind::Sibnet => "Sibnet",
            HostKind::YourVid => "YourVid",
        }
    }

    pub fn all() -> impl Iterator<Item = HostKind> {
        HOSTS.iter().map(|(kind, _)| *kind)
    }
}

/// First host whose keyword occurs in `text` (URL or label)
pub fn sniff(text: &str) -> Option<HostKind> {
    let text = text.to_lowercase();
    HOSTS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(kind, _)| *kind)
}

/// Sniff the URL first, then the site's label for it
pub fn sniff_server(url: &str, label: &str) -> Option<HostKind> {
    sniff(url).or_else(|| sniff(label))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_urls() {
        assert_eq!(sniff("https://filemoon.sx/e/abc123"), Some(HostKind::Filemoon));
        assert_eq!(sniff("https://streamtape.com/e/xyz"), Some(HostKind::StreamTape));
        assert_eq!(sniff("https://d0o0d.com/e/xyz"), Some(HostKind::Dood));
        assert_eq!(sniff("https://www.mp4upload.com/embed-x.html"), Some(HostKind::Mp4Upload));
        assert_eq!(sniff("https://ok.ru/videoembed/123"), Some(HostKind::OkRu));
        assert_eq!(sniff("https://example.com/player"), None);
    }

    #[test]
    fn test_specific_before_generic() {
        // "streamwish" also contains "swish"; "filelions" contains "lion"
        assert_eq!(sniff("https://streamwish.to/e/1"), Some(HostKind::StreamWish));
        assert_eq!(sniff("https://filelions.to/v/1"), Some(HostKind::FileLions));
        assert_eq!(sniff("https://vidhidepro.com/v/1"), Some(HostKind::VidHide));
    }

    #[test]
    fn test_case_insensitive_labels() {
        assert_eq!(sniff("VOE"), Some(HostKind::Voe));
        assert_eq!(sniff_server("https://cdn.example/e/1", "Mixdrop HD"), Some(HostKind::MixDrop));
        assert_eq!(sniff_server("https://uqload.io/e", "Voe"), Some(HostKind::Uqload));
    }

    #[test]
    fn test_table_covers_every_kind_once() {
        let kinds: Vec<HostKind> = HostKind::all().collect();
        let unique: std::collections::HashSet<_> = kinds.iter().collect();
        assert_eq!(kinds.len(), unique.len());
        assert!(kinds.len() >= 30);
    }
}
