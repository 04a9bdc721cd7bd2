//! 网络: 网卡地址、无线信号强度、ESSID

use std::ffi::CStr;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::path::{Path, PathBuf};

use crate::error::ProbeError;

use super::{read_trimmed, required, Probe, Sample};

const SYS_CLASS_NET: &str = "/sys/class/net";
const PROC_NET_WIRELESS: &str = "/proc/net/wireless";

/// `/proc/net/wireless` 的 link quality 最大值
const LINK_QUALITY_MAX: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpAddress {
    V4,
    V6,
}

impl IpAddress {
    fn family(self) -> libc::c_int {
        match self {
            IpAddress::V4 => libc::AF_INET,
            IpAddress::V6 => libc::AF_INET6,
        }
    }
}

impl Probe for IpAddress {
    fn sample(&mut self, argument: Option<&str>) -> Sample {
        let interface = required(argument)?;
        interface_address(interface, self.family()).map(|addr| addr.to_string())
    }
}

/// 遍历 getifaddrs, 返回指定网卡第一个该协议族的地址
fn interface_address(interface: &str, family: libc::c_int) -> Result<IpAddr, ProbeError> {
    let mut head: *mut libc::ifaddrs = std::ptr::null_mut();
    // SAFETY: head 由 getifaddrs 填充, 之后由 freeifaddrs 释放
    if unsafe { libc::getifaddrs(&mut head) } == -1 {
        return Err(ProbeError::Os(io::Error::last_os_error()));
    }

    let mut found = None;
    let mut cursor = head;
    while !cursor.is_null() {
        // SAFETY: cursor 是链表中的有效节点
        let ifa = unsafe { &*cursor };
        cursor = ifa.ifa_next;

        if ifa.ifa_addr.is_null() || ifa.ifa_name.is_null() {
            continue;
        }
        // SAFETY: ifa_name 是以 NUL 结尾的字符串
        let name = unsafe { CStr::from_ptr(ifa.ifa_name) };
        if name.to_bytes() != interface.as_bytes() {
            continue;
        }
        // SAFETY: ifa_addr 非空, sa_family 决定了具体的结构体类型
        let addr_family = libc::c_int::from(unsafe { (*ifa.ifa_addr).sa_family });
        if addr_family != family {
            continue;
        }

        // SAFETY: 上面已确认 sa_family 与 family 一致
        found = Some(unsafe { sockaddr_to_ip(ifa.ifa_addr, family) });
        break;
    }

    // SAFETY: head 来自成功的 getifaddrs 调用
    unsafe { libc::freeifaddrs(head) };
    found.ok_or_else(|| ProbeError::NotFound(format!("address on interface {}", interface)))
}

/// # Safety
/// `addr` 必须指向与 `family` 对应的 sockaddr_in / sockaddr_in6
unsafe fn sockaddr_to_ip(addr: *const libc::sockaddr, family: libc::c_int) -> IpAddr {
    if family == libc::AF_INET {
        let sin = &*(addr as *const libc::sockaddr_in);
        IpAddr::V4(Ipv4Addr::from(u32::from_be(sin.sin_addr.s_addr)))
    } else {
        let sin6 = &*(addr as *const libc::sockaddr_in6);
        IpAddr::V6(Ipv6Addr::from(sin6.sin6_addr.s6_addr))
    }
}

/// `wifi_perc`: 网卡必须处于 up 状态
#[derive(Debug)]
pub struct WifiPerc {
    net_root: PathBuf,
    wireless: PathBuf,
}

impl Default for WifiPerc {
    fn default() -> Self {
        Self::with_paths(SYS_CLASS_NET, PROC_NET_WIRELESS)
    }
}

impl WifiPerc {
    pub fn with_paths(net_root: impl Into<PathBuf>, wireless: impl Into<PathBuf>) -> Self {
        Self { net_root: net_root.into(), wireless: wireless.into() }
    }
}

impl Probe for WifiPerc {
    fn sample(&mut self, argument: Option<&str>) -> Sample {
        let interface = required(argument)?;
        let state = read_trimmed(&self.net_root.join(interface).join("operstate"))?;
        if state != "up" {
            return Err(ProbeError::NotFound(format!("{} is {}", interface, state)));
        }
        link_quality(&self.wireless, interface).map(|perc| perc.to_string())
    }
}

/// 解析 `/proc/net/wireless`:
/// ```text
///  face | tus | link level noise | ...
/// wlp3s0: 0000   54.  -56.  -256 ...
/// ```
fn link_quality(path: &Path, interface: &str) -> Result<u64, ProbeError> {
    let contents = std::fs::read_to_string(path).map_err(|err| ProbeError::io(path, err))?;
    let needle = format!("{}:", interface);

    let line = contents
        .lines()
        .map(str::trim_start)
        .find(|line| line.starts_with(&needle))
        .ok_or_else(|| ProbeError::NotFound(format!("{} in {}", interface, path.display())))?;

    let link = line[needle.len()..]
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| ProbeError::parse("wireless line", line))?;
    let quality = link
        .trim_end_matches('.')
        .parse::<f64>()
        .map_err(|_| ProbeError::parse("link quality", link))?;

    Ok((quality * 100.0 / LINK_QUALITY_MAX).clamp(0.0, 100.0) as u64)
}

const SIOCGIWESSID: libc::c_ulong = 0x8B1B;
const IW_ESSID_MAX_SIZE: usize = 32;

#[repr(C)]
struct IwPoint {
    pointer: *mut libc::c_void,
    length: u16,
    flags: u16,
}

/// `struct iwreq`, 联合体部分固定 16 字节
#[repr(C)]
struct IwReq {
    ifr_name: [libc::c_char; libc::IFNAMSIZ],
    essid: IwPoint,
    _pad: [u8; 16 - std::mem::size_of::<IwPoint>()],
}

/// `wifi_essid`
#[derive(Debug)]
pub struct WifiEssid;

impl Probe for WifiEssid {
    fn sample(&mut self, argument: Option<&str>) -> Sample {
        let interface = required(argument)?;
        if interface.len() >= libc::IFNAMSIZ || interface.contains('\0') {
            return Err(ProbeError::parse("interface name", interface));
        }

        // SAFETY: socket 没有指针参数; 成功时返回的 fd 交给 OwnedFd 关闭
        let raw = unsafe { libc::socket(libc::AF_INET, libc::SOCK_DGRAM, 0) };
        if raw == -1 {
            return Err(ProbeError::Os(io::Error::last_os_error()));
        }
        // SAFETY: raw 是刚创建的有效 fd, 没有其他所有者
        let socket = unsafe { OwnedFd::from_raw_fd(raw) };

        let mut id = [0u8; IW_ESSID_MAX_SIZE + 1];
        let mut request = IwReq {
            ifr_name: [0; libc::IFNAMSIZ],
            essid: IwPoint {
                pointer: id.as_mut_ptr().cast(),
                length: id.len() as u16,
                flags: 0,
            },
            _pad: [0; 16 - std::mem::size_of::<IwPoint>()],
        };
        for (dst, src) in request.ifr_name.iter_mut().zip(interface.bytes()) {
            *dst = src as libc::c_char;
        }

        // SAFETY: request 与内核 struct iwreq 布局一致, essid 指向 id 缓冲区
        if unsafe { libc::ioctl(socket.as_raw_fd(), SIOCGIWESSID as _, &mut request as *mut IwReq) } == -1 {
            return Err(ProbeError::Os(io::Error::last_os_error()));
        }

        let essid = CStr::from_bytes_until_nul(&id)
            .map(|essid| essid.to_string_lossy().into_owned())
            .unwrap_or_default();
        if essid.is_empty() {
            return Err(ProbeError::NotFound(format!("essid for {}", interface)));
        }
        Ok(essid)
    }
}
