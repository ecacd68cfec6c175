/// Built-in manifest sources used when no `--url` is given.
///
/// Public radio streams with stable, long-lived live playlists. The
/// harvester only ever exercises one of them per run.
const DEFAULT_SOURCES: &[&str] = &[
    "http://sk.cri.cn/hyhq.m3u8",
    "http://sk.cri.cn/hxfh.m3u8",
    "http://sk.cri.cn/nhzs.m3u8",
    "http://sk.cri.cn/am846.m3u8",
    "http://sk.cri.cn/905.m3u8",
    "http://sk.cri.cn/915.m3u8",
    "http://ngcdn001.cnr.cn/live/zgzs/index.m3u8",
    "http://ngcdn002.cnr.cn/live/jjzs/index.m3u8",
    "http://ngcdn003.cnr.cn/live/yyzs/index.m3u8",
    "http://ngcdn004.cnr.cn/live/dszs/index.m3u8",
    "http://ngcdn005.cnr.cn/live/zhzs/index.m3u8",
    "https://brtv-radiolive.rbc.cn/alive/fm945.m3u8",
    "http://stream3.hndt.com/now/4pcovD2L/chunklist.m3u8",
];

pub fn default_sources() -> Vec<String> {
    DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect()
}
