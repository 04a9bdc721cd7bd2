//! 当前用户: uid / gid / 用户名

use std::ffi::CStr;
use std::io;

use crate::error::ProbeError;

use super::{Probe, Sample};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Identity {
    Uid,
    Gid,
    Username,
}

impl Probe for Identity {
    fn sample(&mut self, _argument: Option<&str>) -> Sample {
        match self {
            // SAFETY: geteuid / getgid 总是成功, 没有参数
            Identity::Uid => Ok(unsafe { libc::geteuid() }.to_string()),
            Identity::Gid => Ok(unsafe { libc::getgid() }.to_string()),
            Identity::Username => username(unsafe { libc::geteuid() }),
        }
    }
}

/// 通过 `getpwuid_r` 查找用户名
fn username(uid: libc::uid_t) -> Sample {
    let mut buf = vec![0 as libc::c_char; 4096];
    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut result: *mut libc::passwd = std::ptr::null_mut();

    loop {
        // SAFETY: 所有指针都指向本函数内有效的缓冲区, 长度与 buf 一致
        let rc = unsafe { libc::getpwuid_r(uid, &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result) };
        if rc == libc::ERANGE && buf.len() < 1 << 20 {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 {
            return Err(ProbeError::Os(io::Error::from_raw_os_error(rc)));
        }
        break;
    }

    if result.is_null() || pwd.pw_name.is_null() {
        return Err(ProbeError::NotFound(format!("passwd entry for uid {}", uid)));
    }

    // SAFETY: 成功时 pw_name 指向 buf 中以 NUL 结尾的字符串
    let name = unsafe { CStr::from_ptr(pwd.pw_name) };
    Ok(name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_numeric() {
        assert!(Identity::Uid.sample(None).unwrap().parse::<u32>().is_ok());
        assert!(Identity::Gid.sample(None).unwrap().parse::<u32>().is_ok());
    }

    #[test]
    fn root_is_named_root() {
        assert_eq!(username(0).unwrap(), "root");
    }
}
